// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use cloud_gateway_controller::{
    config::EngineConfig,
    constants::{
        DEFAULT_BIND_ADDRESS, DEFAULT_CONTROLLER_NAME, DEFAULT_RECONCILE_TIMEOUT_SECS,
        ERROR_REQUEUE_DURATION_SECS, KIND_GATEWAY, KIND_GATEWAY_CLASS, KIND_HTTP_ROUTE,
        RESYNC_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS, TRANSIENT_ERROR_REQUEUE_DURATION_SECS,
    },
    context::Context,
    crd::{Gateway, GatewayClass, HTTPRoute},
    errors::ReconcileError,
    metrics,
    reconcilers::{
        reconcile_gateway, reconcile_gatewayclass, reconcile_httproute, ReconcileOutcome,
    },
    store::KubeStore,
    webhook::build_router,
};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Gateway API controller deriving shadow gateways and templated children.
#[derive(Debug, Parser)]
#[command(name = "cloud-gateway-controller", version, about)]
struct Cli {
    /// Identity matched against `GatewayClass.spec.controllerName`
    #[arg(long, env = "CONTROLLER_NAME", default_value = DEFAULT_CONTROLLER_NAME)]
    controller_name: String,

    /// Field manager for writes (defaults to the controller name)
    #[arg(long, env = "FIELD_MANAGER")]
    field_manager: Option<String>,

    /// Deadline for a single reconcile, in seconds
    #[arg(long, env = "RECONCILE_TIMEOUT_SECS", default_value_t = DEFAULT_RECONCILE_TIMEOUT_SECS)]
    reconcile_timeout_secs: u64,

    /// Address of the health, metrics and webhook server
    #[arg(long, env = "BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
    bind_address: String,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::new(self.controller_name.clone())
            .with_reconcile_timeout(Duration::from_secs(self.reconcile_timeout_secs));
        match &self.field_manager {
            Some(field_manager) => config.with_field_manager(field_manager.clone()),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("cloud-gateway-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_logging() {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json|text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging();
    info!(
        controller_name = %cli.controller_name,
        bind_address = %cli.bind_address,
        "Starting Cloud Gateway Controller"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    let ctx = Arc::new(Context::new(
        Arc::new(KubeStore::new(client.clone())),
        cli.engine_config(),
    ));

    let listener = tokio::net::TcpListener::bind(&cli.bind_address).await?;
    info!(address = %cli.bind_address, "Serving health, metrics and webhook endpoints");

    // Controllers should never exit - if one does, log it and exit the process
    tokio::select! {
        result = async { axum::serve(listener, build_router()).await } => {
            error!("CRITICAL: HTTP server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("HTTP server exited unexpectedly without error")
        }
        result = run_gateway_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: Gateway controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Gateway controller exited unexpectedly without error")
        }
        result = run_httproute_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: HTTPRoute controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("HTTPRoute controller exited unexpectedly without error")
        }
        result = run_gatewayclass_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: GatewayClass controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("GatewayClass controller exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping controllers");
            Ok(())
        }
    }
}

/// Run the `Gateway` controller.
///
/// Shadow gateways are owned by their parent, so changes to them requeue the
/// parent. Class changes requeue every gateway of that class.
async fn run_gateway_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting Gateway controller");

    let gateways = Api::<Gateway>::all(client.clone());
    let controller = Controller::new(gateways.clone(), Config::default())
        .owns(gateways, Config::default());
    let gateway_store = controller.store();

    controller
        .watches(
            Api::<GatewayClass>::all(client),
            Config::default(),
            move |class: GatewayClass| {
                let class_name = class.name_any();
                gateway_store
                    .state()
                    .into_iter()
                    .filter(|gw| gw.spec.gateway_class_name == class_name)
                    .map(|gw| ObjectRef::from_obj(&*gw))
                    .collect::<Vec<_>>()
            },
        )
        .run(reconcile_gateway_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `HTTPRoute` controller
async fn run_httproute_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting HTTPRoute controller");

    let routes = Api::<HTTPRoute>::all(client);
    Controller::new(routes.clone(), Config::default())
        .owns(routes, Config::default())
        .run(reconcile_httproute_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `GatewayClass` controller
async fn run_gatewayclass_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting GatewayClass controller");

    Controller::new(Api::<GatewayClass>::all(client), Config::default())
        .run(reconcile_gatewayclass_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Record the outcome of one reconcile and pick the next requeue.
fn finish(
    kind: &str,
    name: &str,
    started: Instant,
    result: Result<ReconcileOutcome, ReconcileError>,
) -> Result<Action, ReconcileError> {
    let elapsed = started.elapsed();
    match result {
        Ok(ReconcileOutcome::Applied(summary)) => {
            metrics::record_reconciliation_success(kind, elapsed);
            debug!(kind = %kind, name = %name, writes = summary.writes(), "Reconciled");
            Ok(Action::requeue(Duration::from_secs(RESYNC_REQUEUE_DURATION_SECS)))
        }
        Ok(ReconcileOutcome::Skipped(reason)) => {
            metrics::record_reconciliation_skipped(kind, elapsed);
            debug!(kind = %kind, name = %name, reason = ?reason, "Skipped");
            Ok(Action::requeue(Duration::from_secs(RESYNC_REQUEUE_DURATION_SECS)))
        }
        Err(e) => {
            metrics::record_reconciliation_error(kind, elapsed);
            if e.is_transient() {
                warn!(kind = %kind, name = %name, error = %e, "Reconcile failed, retrying soon");
            } else {
                error!(kind = %kind, name = %name, error = %e, "Failed to reconcile");
            }
            Err(e)
        }
    }
}

/// Reconcile wrapper for `Gateway`
async fn reconcile_gateway_wrapper(
    gateway: Arc<Gateway>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let started = Instant::now();
    let name = gateway.name_any();
    let namespace = gateway.namespace().unwrap_or_default();
    let result = reconcile_gateway(&ctx, &namespace, &name).await;
    finish(KIND_GATEWAY, &name, started, result)
}

/// Reconcile wrapper for `HTTPRoute`
async fn reconcile_httproute_wrapper(
    route: Arc<HTTPRoute>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let started = Instant::now();
    let name = route.name_any();
    let namespace = route.namespace().unwrap_or_default();
    let result = reconcile_httproute(&ctx, &namespace, &name).await;
    finish(KIND_HTTP_ROUTE, &name, started, result)
}

/// Reconcile wrapper for `GatewayClass`
async fn reconcile_gatewayclass_wrapper(
    class: Arc<GatewayClass>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let started = Instant::now();
    let name = class.name_any();
    let result = reconcile_gatewayclass(&ctx, &name).await;
    finish(KIND_GATEWAY_CLASS, &name, started, result)
}

/// Requeue delay after a failed reconcile.
fn requeue_after(err: &ReconcileError) -> Duration {
    if err.is_transient() {
        Duration::from_secs(TRANSIENT_ERROR_REQUEUE_DURATION_SECS)
    } else {
        Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)
    }
}

/// Error policy shared by all controllers
fn error_policy(
    _resource: Arc<impl std::fmt::Debug>,
    err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    Action::requeue(requeue_after(err))
}
