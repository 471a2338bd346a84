use super::{Context, parse_pairs};
use crate::output::{print_json, resource_detail, resource_table};
use colored::Colorize;
use nimbus_driver::{
    Collection, CreateParams, FilterPredicate, InstanceParams, ProfileSelection, PropertyValue,
    Resource,
};

pub async fn list(ctx: &Context, collection: Collection, filters: &[String]) -> anyhow::Result<()> {
    let predicate = FilterPredicate::from_options(parse_pairs(filters)?);
    let resources = ctx
        .dispatcher
        .list(ctx.credentials()?, collection, &predicate)
        .await?;

    if ctx.json {
        return print_json(&resources);
    }
    resource_table(&resources);
    Ok(())
}

pub async fn show(ctx: &Context, collection: Collection, id: &str) -> anyhow::Result<()> {
    let resource = ctx
        .dispatcher
        .get(ctx.credentials()?, collection, id)
        .await?;
    print_resource(ctx, &resource)
}

/// Arguments of `create-instance`
pub struct InstanceRequest {
    pub image: String,
    pub profile: Option<String>,
    pub overrides: Vec<String>,
    pub name: Option<String>,
    pub realm: Option<String>,
    pub user_data: Option<String>,
}

impl InstanceRequest {
    fn into_params(self) -> anyhow::Result<InstanceParams> {
        let overrides = parse_pairs(&self.overrides)?;
        let selection = match (self.profile, overrides.is_empty()) {
            (Some(name), _) => Some(with_overrides(ProfileSelection::new(name), &overrides)),
            (None, true) => None,
            (None, false) => anyhow::bail!("--set requires --profile"),
        };

        Ok(InstanceParams {
            image_id: self.image,
            name: None,
            realm_id: self.realm,
            hardware_profile: selection,
            user_data: self.user_data,
            user_name: self.name,
        })
    }
}

fn with_overrides(selection: ProfileSelection, overrides: &[(&str, &str)]) -> ProfileSelection {
    overrides.iter().fold(selection, |selection, (key, value)| {
        let value = match value.parse::<i64>() {
            Ok(n) => PropertyValue::Int(n),
            Err(_) => PropertyValue::from(*value),
        };
        selection.with(*key, value)
    })
}

pub async fn create_instance(ctx: &Context, request: InstanceRequest) -> anyhow::Result<()> {
    let params = request.into_params()?;
    let instance = ctx
        .dispatcher
        .create(ctx.credentials()?, CreateParams::Instance(params))
        .await?;

    if !ctx.json {
        println!("{} {}", "✓ Created instance".green(), instance.id.cyan());
    }
    print_resource(ctx, &instance)
}

pub async fn act(
    ctx: &Context,
    collection: Collection,
    id: &str,
    action: &str,
) -> anyhow::Result<()> {
    let resource = ctx
        .dispatcher
        .act(ctx.credentials()?, collection, id, action)
        .await?;

    if !ctx.json {
        println!("{} {} {}", "✓".green(), action.cyan(), id);
    }
    print_resource(ctx, &resource)
}

pub async fn destroy(ctx: &Context, collection: Collection, id: &str) -> anyhow::Result<()> {
    ctx.dispatcher
        .destroy(ctx.credentials()?, collection, id)
        .await?;

    if ctx.json {
        return print_json(&serde_json::json!({ "destroyed": id }));
    }
    println!("{} {} {}", "✓ Destroyed".green(), collection, id.cyan());
    Ok(())
}

fn print_resource(ctx: &Context, resource: &Resource) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(resource);
    }
    resource_detail(resource);
    Ok(())
}
