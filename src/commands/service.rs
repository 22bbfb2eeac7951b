use crate::commands::CollarCommands;
use crate::dispatch::{CommandContext, CommandTree, lit};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::services::CollarState;

pub(super) fn register<S: 'static>(
    c: &CollarCommands,
    tree: &mut CommandTree<S>,
) -> Result<(), DuplicateBindingError> {
    c.on(tree, [lit("connect")], connect)?;
    c.on(tree, [lit("disconnect")], disconnect)?;
    c.on(tree, [lit("status")], status)?;
    Ok(())
}

fn connect<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>) -> CommandResult {
    c.collar.connect();
    Ok(())
}

fn disconnect<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>) -> CommandResult {
    c.collar.disconnect();
    Ok(())
}

fn status<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>) -> CommandResult {
    c.collar.with_or(
        |collar| {
            c.display
                .display_info_message(&format!("Collar is {}", collar.state()));
        },
        || match c.collar.state() {
            CollarState::Disconnected => c.display.display_message("Collar is disconnected"),
            state => c.display.display_info_message(&format!("Collar is {state}")),
        },
    );
    Ok(())
}
