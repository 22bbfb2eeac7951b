use crate::commands::arguments::{WaypointRef, group_waypoint, groups, private_waypoint};
use crate::commands::{CollarCommands, CommandError};
use crate::dispatch::{CommandContext, CommandTree, arg, lit};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::input::arguments::{dimension, double, string};
use crate::models::group::Group;
use crate::models::types::{Dimension, Location};
use crate::models::waypoint::Waypoint;

pub(super) fn register<S: 'static>(
    c: &CollarCommands,
    tree: &mut CommandTree<S>,
) -> Result<(), DuplicateBindingError> {
    c.on(tree, [lit("waypoint"), lit("add"), arg("name", string())], add_here)?;
    c.on(
        tree,
        [lit("waypoint"), lit("remove"), arg("name", private_waypoint(&c.collar))],
        remove,
    )?;
    c.on(tree, [lit("waypoint"), lit("list")], list)?;
    c.on(tree, [lit("waypoint"), lit("list"), arg("group", groups(&c.collar))], list_group)?;
    c.on(
        tree,
        [
            lit("waypoint"),
            lit("add"),
            arg("name", string()),
            arg("x", double()),
            arg("y", double()),
            arg("z", double()),
            arg("dimension", dimension()),
            lit("to"),
            arg("group", groups(&c.collar)),
        ],
        add_to_group,
    )?;
    c.on(
        tree,
        [
            lit("waypoint"),
            lit("remove"),
            arg("name", group_waypoint(&c.collar)),
            lit("from"),
            arg("group", groups(&c.collar)),
        ],
        remove_from_group,
    )?;
    c.on(
        tree,
        [
            lit("waypoint"),
            lit("add"),
            arg("name", string()),
            arg("x", double()),
            arg("y", double()),
            arg("z", double()),
            arg("dimension", dimension()),
        ],
        add_at,
    )?;
    Ok(())
}

fn location_arg<S>(ctx: &CommandContext<'_, S>) -> Result<Location, CommandError> {
    Ok(Location::new(
        *ctx.get::<f64>("x")?,
        *ctx.get::<f64>("y")?,
        *ctx.get::<f64>("z")?,
        *ctx.get::<Dimension>("dimension")?,
    ))
}

/// Adds a private waypoint where the player is standing.
fn add_here<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let name = ctx.get::<String>("name")?;
    let here = c.world.current_player().ok_or(CommandError::NotInWorld)?;
    let location = Location::new(here.x, here.y, here.z, here.dimension);
    c.connected(|collar| collar.location().add_waypoint(name, location))
}

fn add_at<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let name = ctx.get::<String>("name")?;
    let location = location_arg(ctx)?;
    c.connected(|collar| collar.location().add_waypoint(name, location))
}

fn add_to_group<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let name = ctx.get::<String>("name")?;
    let group = ctx.get::<Group>("group")?;
    let location = location_arg(ctx)?;
    c.connected(|collar| collar.location().add_group_waypoint(group, name, location))
}

fn remove<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let target = ctx.get::<WaypointRef>("name")?;
    c.connected(|collar| collar.location().remove_waypoint(&target.waypoint))
}

fn remove_from_group<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("group")?;
    let target = ctx.get::<WaypointRef>("name")?;
    c.connected(|collar| {
        let location = collar.location();
        // The name resolved against the first group holding it; the one
        // named after `from` decides.
        let waypoint = match &target.group {
            Some(owner) if owner.id == group.id => Some(target.waypoint.clone()),
            _ => location
                .group_waypoints(group)
                .into_iter()
                .find(|w| w.name == target.waypoint.name),
        };
        match waypoint {
            Some(w) => location.remove_group_waypoint(group, &w),
            None => c.display.display_info_message(&format!(
                "Waypoint {} does not belong to group {}",
                target.waypoint, group.name
            )),
        }
    })
}

fn list<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>) -> CommandResult {
    let waypoints = c.connected(|collar| collar.location().private_waypoints())?;
    show(c, &waypoints, "You have no private waypoints");
    Ok(())
}

fn list_group<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("group")?;
    let waypoints = c.connected(|collar| collar.location().group_waypoints(group))?;
    show(c, &waypoints, "You have no group waypoints");
    Ok(())
}

fn show(c: &CollarCommands, waypoints: &[Waypoint], empty: &str) {
    if waypoints.is_empty() {
        c.display.display_info_message(empty);
        return;
    }
    for w in waypoints {
        c.display.display_info_message(&w.display_name());
    }
}
