//! Profiles, features, lifecycles and error rules of the mock driver

use nimbus_driver::{
    Collection, Constraints, Declarations, HardwareProfile, Lifecycle, Property, RegistrationError,
};

/// Storage available to all volumes together, in GB
pub const STORAGE_QUOTA_GB: i64 = 1000;

pub fn declarations() -> Result<Declarations, RegistrationError> {
    let builder = Declarations::builder()
        .hardware_profile(
            HardwareProfile::new("m1-small")
                .property(Property::fixed("cpu", [1]))
                .property(Property::fixed("memory", [1740]))
                .property(Property::fixed("storage", [160]))
                .property(Property::fixed("architecture", ["i386"])),
        )?
        .hardware_profile(
            HardwareProfile::new("m1-large")
                .property(Property::range("cpu", 1, 6).with_default(1))
                .property(Property::range("memory", 7680, 15360).with_default(10240))
                .property(Property::fixed("storage", [850, 1024]).with_default(850))
                .property(Property::fixed("architecture", ["x86_64"])),
        )?
        .hardware_profile(
            HardwareProfile::new("m1-xlarge")
                .property(Property::fixed("cpu", [4]))
                .property(Property::stepped("memory", 12288, 32768, 1024).with_default(12288))
                .property(Property::fixed("storage", [1024, 2048, 4096]))
                .property(Property::fixed("architecture", ["x86_64"])),
        )?
        .hardware_profile(
            HardwareProfile::new("opaque")
                .property(Property::fixed("architecture", ["i386", "x86_64"]).with_default("x86_64")),
        )?
        .feature(Collection::Instances, "user_data")
        .feature_with(
            Collection::Instances,
            "user_name",
            Constraints::new().with("max_length", 50),
        )
        .feature(Collection::Instances, "realm_filter")
        .feature(Collection::Images, "user_name")
        .lifecycle(Collection::Instances, instance_lifecycle()?)?
        .lifecycle(Collection::StorageVolumes, volume_lifecycle()?)?
        .error_pattern("Authentication failed", 401)?
        .error_pattern("not found", 404)?
        .error_substring("quota", 409)?
        .error_pattern("timed? ?out", 504)?
        .error_pattern(".*", 502)?;

    Ok(builder.build())
}

fn instance_lifecycle() -> Result<Lifecycle, RegistrationError> {
    Lifecycle::builder()
        .initial("start")
        .terminal("finish")
        .automatic("start", "pending")
        .automatic("pending", "running")
        .on("running", "running", "reboot")
        .on("running", "stopping", "stop")
        .automatic("stopping", "stopped")
        .on("stopped", "running", "start")
        .on("stopped", "finish", "destroy")
        .build()
}

fn volume_lifecycle() -> Result<Lifecycle, RegistrationError> {
    Lifecycle::builder()
        .initial("creating")
        .terminal("deleted")
        .automatic("creating", "available")
        .on("available", "in-use", "attach")
        .on("in-use", "available", "detach")
        .on("available", "deleted", "destroy")
        .build()
}
