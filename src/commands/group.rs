use crate::commands::CollarCommands;
use crate::commands::arguments::{group, identity, invitation, player};
use crate::dispatch::{CommandContext, CommandTree, arg, lit};
use crate::error::{CommandResult, DuplicateBindingError};
use crate::input::arguments::string;
use crate::models::group::{Group, GroupType, Invitation};
use crate::models::player::{Identity, Player};

pub(super) fn register<S: 'static>(
    c: &CollarCommands,
    tree: &mut CommandTree<S>,
) -> Result<(), DuplicateBindingError> {
    for t in GroupType::ALL {
        let kind = t.name();
        c.on(tree, [lit(kind), lit("create"), arg("name", string())], move |cmds, ctx| create(cmds, ctx, t))?;
        c.on(tree, [lit(kind), lit("delete"), arg("name", group(&c.collar, t))], delete)?;
        c.on(tree, [lit(kind), lit("leave"), arg("name", group(&c.collar, t))], leave)?;
        c.on(tree, [lit(kind), lit("accept"), arg("groupName", invitation(&c.collar, t))], accept)?;
        c.on(tree, [lit(kind), lit("list")], move |cmds, ctx| list(cmds, ctx, t))?;
        c.on(
            tree,
            [
                lit(kind),
                arg("groupName", group(&c.collar, t)),
                lit("add"),
                arg("playerName", player(&c.world)),
            ],
            invite,
        )?;
        c.on(
            tree,
            [
                lit(kind),
                arg("groupName", group(&c.collar, t)),
                lit("remove"),
                arg("playerName", identity(&c.collar, &c.world)),
            ],
            remove_member,
        )?;
    }
    Ok(())
}

fn create<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>, t: GroupType) -> CommandResult {
    let name = ctx.get::<String>("name")?;
    c.connected(|collar| collar.groups().create(name, t, &[]))
}

fn delete<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("name")?;
    c.connected(|collar| collar.groups().delete(group))
}

fn leave<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("name")?;
    c.connected(|collar| collar.groups().leave(group))
}

fn accept<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let invitation = ctx.get::<Invitation>("groupName")?;
    c.connected(|collar| collar.groups().accept(invitation))
}

fn list<S>(c: &CollarCommands, _ctx: &CommandContext<'_, S>, t: GroupType) -> CommandResult {
    let groups: Vec<Group> = c
        .connected(|collar| collar.groups().all())?
        .into_iter()
        .filter(|g| g.group_type == t)
        .collect();
    if groups.is_empty() {
        c.display
            .display_info_message(&format!("You are not a member of any {}", t.plural()));
        return Ok(());
    }
    c.display
        .display_info_message(&format!("You belong to the following {}:", t.plural()));
    for g in &groups {
        c.display.display_info_message(&g.name);
    }
    Ok(())
}

fn invite<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("groupName")?;
    let player = ctx.get::<Player>("playerName")?;
    c.connected(|collar| collar.groups().invite(group, std::slice::from_ref(player)))
}

fn remove_member<S>(c: &CollarCommands, ctx: &CommandContext<'_, S>) -> CommandResult {
    let group = ctx.get::<Group>("groupName")?;
    let who = ctx.get::<Identity>("playerName")?;
    let member = group.members.iter().find(|m| match who {
        Identity::Profile(p) => m.profile.id == p.id,
        Identity::Player(p) => m.profile.name.eq_ignore_ascii_case(&p.name),
    });
    match member {
        Some(member) => c.connected(|collar| collar.groups().remove_member(group, member)),
        None => {
            c.display
                .display_message(&format!("{} is not a member of {}", who.name(), group.name));
            Ok(())
        }
    }
}
