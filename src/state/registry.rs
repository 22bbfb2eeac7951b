use crate::commands::{CollarCommands, PREFIX};
use crate::config::{Config, ExecutorKind};
use crate::dispatch::{CommandTree, DispatchResult, SharedDispatcher};
use crate::display::Display;
use crate::error::InfraError;
use crate::events::{EventBus, Executor, InlineExecutor, TaskQueue, TokioExecutor};
use crate::host::HostAdapter;
use crate::integrations::{ChatCommandTarget, WaypointCommandIntegration};
use crate::models::player::Profile;
use crate::services::{CollarService, Connector, LocalCollar, LocalConnector};
use crate::state::source::Source;
use crate::world::{StaticWorld, World};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct Services {
    pub collar: Arc<CollarService>,
    /// In-memory backend the connector hands out.
    pub backend: Arc<LocalCollar>,
}

/// Composition root: builds every long-lived piece once and wires them up.
pub struct Registry {
    pub config: Arc<Config>,
    pub events: Arc<EventBus>,
    pub display: Arc<dyn Display>,
    pub world: Arc<StaticWorld>,
    pub services: Arc<Services>,
    pub host: Arc<HostAdapter>,
    pub dispatcher: SharedDispatcher<Source>,
    /// Set when GLOBAL deliveries are drained on the tick.
    pub tasks: Option<Arc<TaskQueue>>,
    pub waypoints: Arc<WaypointCommandIntegration<ChatCommandTarget>>,
}

impl Registry {
    pub fn new(
        config: Arc<Config>,
        display: Arc<dyn Display>,
        runtime: Option<Handle>,
    ) -> Result<Self, InfraError> {
        let (executor, tasks) = build_executor(config.executor, runtime.as_ref());
        let events = Arc::new(EventBus::new(executor));

        let world = Arc::new(StaticWorld::new());
        let backend = Arc::new(LocalCollar::new(
            Profile::new(config.player_name.clone()),
            display.clone(),
            events.clone(),
        ));
        let connector: Arc<dyn Connector> = Arc::new(LocalConnector::new(backend.clone()));
        let collar = Arc::new(CollarService::new(connector, display.clone(), events.clone(), runtime));

        let mut tree = CommandTree::new();
        let world_view: Arc<dyn World> = world.clone();
        CollarCommands::new(collar.clone(), display.clone(), world_view, config.prefixed).register(&mut tree)?;
        let tree = checked(tree)?;

        let waypoints = Arc::new(WaypointCommandIntegration::new(
            ChatCommandTarget::new(
                config.waypoints.prefix.clone(),
                config.waypoints.command.clone(),
                config.waypoints.enabled,
            ),
            display.clone(),
        ));
        events.subscribe(&waypoints);

        let host = Arc::new(HostAdapter::new(events.clone()));
        wire_host(&host, &collar, tasks.clone());

        tracing::info!(
            commands = tree.usage().len(),
            executor = ?config.executor,
            prefixed = config.prefixed,
            "registry ready"
        );

        Ok(Self {
            config,
            events,
            display,
            world,
            services: Arc::new(Services { collar, backend }),
            host,
            dispatcher: SharedDispatcher::new(tree),
            tasks,
            waypoints,
        })
    }

    pub fn collar(&self) -> &Arc<CollarService> {
        &self.services.collar
    }

    /// Dispatches one command line and reports anything other than a clean
    /// success through the display.
    pub fn execute(&self, source: Source, line: &str) -> DispatchResult {
        tracing::debug!(%source, line, "command");
        let result = self.dispatcher.dispatch(source, line);
        match &result {
            DispatchResult::Success(Ok(())) => {}
            DispatchResult::Success(Err(e)) => self.display.display_message(&e.to_string()),
            DispatchResult::NoMatch => {
                self.display
                    .display_message(&format!("Unknown or incomplete command: {}", line.trim()));
                self.show_usage(line);
            }
            DispatchResult::ParseError { node, reason, .. } => {
                self.display.display_message(&format!("Invalid {node}: {reason}"));
                self.show_usage(line);
            }
            DispatchResult::ResolutionError { reason, .. } => self.display.display_info_message(reason),
        }
        result
    }

    /// Usage lines for the command family `line` starts with.
    pub fn usage_for(&self, line: &str) -> Vec<String> {
        let depth = if self.config.prefixed { 2 } else { 1 };
        let head: Vec<&str> = line.split_whitespace().take(depth).collect();
        if head.is_empty() || (self.config.prefixed && head[0] != PREFIX) {
            return Vec::new();
        }
        let head = head.join(" ");
        self.dispatcher
            .usage()
            .into_iter()
            .filter(|u| *u == head || u.starts_with(&format!("{head} ")))
            .collect()
    }

    fn show_usage(&self, line: &str) {
        for u in self.usage_for(line) {
            self.display.display_info_message(&format!("Usage: {u}"));
        }
    }
}

/// Refuses a tree that breaks its own invariants.
fn checked<S>(tree: CommandTree<S>) -> Result<CommandTree<S>, InfraError> {
    if let Err(e) = tree.validate() {
        tracing::error!(error = %e, "command tree is inconsistent");
        return Err(e.into());
    }
    Ok(tree)
}

fn build_executor(kind: ExecutorKind, runtime: Option<&Handle>) -> (Arc<dyn Executor>, Option<Arc<TaskQueue>>) {
    let inline: Arc<dyn Executor> = Arc::new(InlineExecutor);
    match kind {
        ExecutorKind::Inline => (inline, None),
        ExecutorKind::Tokio => match runtime {
            Some(h) => {
                let executor: Arc<dyn Executor> = Arc::new(TokioExecutor::new(h.clone()));
                (executor, None)
            }
            None => {
                tracing::warn!("tokio executor requested without a runtime, running inline");
                (inline, None)
            }
        },
        ExecutorKind::Tick => {
            let queue = Arc::new(TaskQueue::new());
            let executor: Arc<dyn Executor> = queue.clone();
            (executor, Some(queue))
        }
    }
}

/// Client hooks: drain queued deliveries every tick, drop the collar
/// connection when the client disconnects, connect when a server world loads.
fn wire_host(host: &HostAdapter, collar: &Arc<CollarService>, tasks: Option<Arc<TaskQueue>>) {
    if let Some(queue) = tasks {
        host.on_tick(move |_| {
            queue.run_pending();
        });
    }

    let c = collar.clone();
    host.on_disconnect(move || c.disconnect());

    let c = collar.clone();
    host.on_world_loaded(move |w| {
        if w.on_server {
            c.connect();
        }
    });
}
