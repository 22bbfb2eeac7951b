use crate::commands::CollarCommands;
use crate::commands::arguments::groups;
use crate::dispatch::{CommandContext, CommandTree, arg, lit};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::models::group::Group;

pub(super) fn register<S: 'static>(
    c: &CollarCommands,
    tree: &mut CommandTree<S>,
) -> Result<(), DuplicateBindingError> {
    c.on(
        tree,
        [lit("location"), lit("share"), lit("start"), arg("groupName", groups(&c.collar))],
        start,
    )?;
    c.on(
        tree,
        [lit("location"), lit("share"), lit("stop"), arg("groupName", groups(&c.collar))],
        stop,
    )?;
    c.on(tree, [lit("location"), lit("share"), lit("list")], list)?;
    Ok(())
}

fn start<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("groupName")?;
    c.connected(|collar| collar.location().start_sharing_with(group))
}

fn stop<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("groupName")?;
    c.connected(|collar| collar.location().stop_sharing_with(group))
}

fn list<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>) -> CommandResult {
    let active: Vec<Group> = c.connected(|collar| {
        collar
            .groups()
            .all()
            .into_iter()
            .filter(|g| collar.location().is_sharing_with(g))
            .collect()
    })?;
    if active.is_empty() {
        c.display
            .display_info_message("You are not sharing your location with any groups");
        return Ok(());
    }
    c.display
        .display_info_message("You are sharing your location with groups:");
    for g in &active {
        c.display
            .display_info_message(&format!("{} ({})", g.name, g.group_type.name()));
    }
    Ok(())
}
