use crate::commands::CollarCommands;
use crate::commands::arguments::identity;
use crate::dispatch::{CommandContext, CommandTree, arg, lit};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::models::player::Identity;

pub(super) fn register<S: 'static>(
    c: &CollarCommands,
    tree: &mut CommandTree<S>,
) -> Result<(), DuplicateBindingError> {
    c.on(tree, [lit("friend"), lit("add"), arg("name", identity(&c.collar, &c.world))], add)?;
    c.on(tree, [lit("friend"), lit("remove"), arg("name", identity(&c.collar, &c.world))], remove)?;
    c.on(tree, [lit("friend"), lit("list")], list)?;
    Ok(())
}

fn add<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let who = ctx.get::<Identity>("name")?;
    c.connected(|collar| collar.friends().add_friend(who))
}

fn remove<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let who = ctx.get::<Identity>("name")?;
    c.connected(|collar| collar.friends().remove_friend(who))
}

fn list<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>) -> CommandResult {
    let mut friends = c.connected(|collar| collar.friends().list())?;
    if friends.is_empty() {
        c.display.display_info_message("You don't have any friends");
        return Ok(());
    }
    friends.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.friend.name.cmp(&b.friend.name)));
    for f in &friends {
        c.display
            .display_message(&format!("{} ({})", f.friend.name, f.status.as_str()));
    }
    Ok(())
}
