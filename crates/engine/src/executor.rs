//! The Execution Engine (§4.4) — walks an [`Ast`] depth-first, dispatching
//! each node through the [`nodes::NodeRegistry`] and routing its emitted
//! edge into that node's branch (or back up the call stack if the edge is
//! terminal for that node).
//!
//! Deliberately has no knowledge of persistence: it depends only on a
//! [`NodeRegistry`] and the [`crate::state`] helpers (§2 "Component
//! dependency order"). Whatever wraps a run — the scheduler, the API, the
//! CLI — is responsible for recording `workflow_executions` /
//! `node_executions` rows around calls to [`WorkflowExecutor::run`].

use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use nodes::{traits::ExecutionContext, ExecutableNode, NodeError, NodeRegistry, StateMap};

use crate::error::{EngineFailure, FailureCause};
use crate::models::{Ast, AstNode};
use crate::state;

/// Tuning knobs for one executor instance (§5 "Resource model" / §10
/// "Configuration").
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum retries for a node that fails `NodeError::Retryable`.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub retry_base_delay: Duration,
    /// Re-entries allowed for a single loop node before the run is aborted
    /// as `LoopBoundExceeded` (`ENGINE_LOOP_BOUND`, default 10,000).
    pub loop_bound: u32,
    /// Wall-clock budget for one run (`ENGINE_RUN_TIMEOUT_MS`, default
    /// 30,000ms). Exceeding it aborts the run with `FailureCause::Timeout`
    /// (§5 "Cancellation and timeout").
    pub run_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
            loop_bound: 10_000,
            run_timeout: Duration::from_millis(30_000),
        }
    }
}

/// The state produced by a run that reached the end of its top-level
/// sequence without aborting.
#[derive(Debug)]
pub struct RunOutcome {
    pub final_state: StateMap,
    pub steps_executed: u64,
}

/// Threaded through the recursive walk: the run's identity, its mutable
/// state, and a step counter (surfaced in [`RunOutcome`] and in logs).
struct RunCtx {
    workflow_id: Uuid,
    execution_id: Uuid,
    state: StateMap,
    steps_executed: u64,
    cancellation: CancellationToken,
}

/// Stateless orchestrator that runs one workflow execution against an
/// [`Ast`]. Cheap to construct per run; the registry it holds is itself an
/// `Arc`-backed clone, so sharing one `WorkflowExecutor` across concurrent
/// runs is also fine (§5).
pub struct WorkflowExecutor {
    registry: NodeRegistry,
    config: ExecutorConfig,
}

impl WorkflowExecutor {
    pub fn new(registry: NodeRegistry, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    /// Run `ast` to completion or to its first aborting failure.
    ///
    /// `overrides` seeds the run's state on top of `ast.initial_state`
    /// (§4.3); pass `None` to run with the declared initial state as-is.
    /// Equivalent to [`Self::run_cancellable`] with a token nothing else
    /// holds, i.e. the run can only be aborted by its own timeout.
    pub async fn run(
        &self,
        ast: &Ast,
        workflow_id: Uuid,
        execution_id: Uuid,
        overrides: Option<&serde_json::Map<String, Value>>,
    ) -> Result<RunOutcome, EngineFailure> {
        self.run_cancellable(ast, workflow_id, execution_id, overrides, CancellationToken::new())
            .await
    }

    /// Run `ast`, honouring both this executor's configured per-run
    /// timeout and external cancellation through `cancellation` (§5
    /// "Cancellation and timeout"). The engine polls `cancellation`
    /// between steps and at each node invocation boundary; it does not
    /// interrupt a node already suspended on I/O.
    #[instrument(skip(self, ast, overrides, cancellation), fields(%workflow_id, %execution_id, steps = ast.steps.len()))]
    pub async fn run_cancellable(
        &self,
        ast: &Ast,
        workflow_id: Uuid,
        execution_id: Uuid,
        overrides: Option<&serde_json::Map<String, Value>>,
        cancellation: CancellationToken,
    ) -> Result<RunOutcome, EngineFailure> {
        let state = state::init_state(&ast.initial_state, overrides);
        let mut ctx = RunCtx {
            workflow_id,
            execution_id,
            state,
            steps_executed: 0,
            cancellation,
        };

        let run_future = self.run_sequence(&ast.steps, &mut ctx, Value::Null);

        match tokio::time::timeout(self.config.run_timeout, run_future).await {
            Ok(Ok(_)) => Ok(RunOutcome {
                final_state: ctx.state,
                steps_executed: ctx.steps_executed,
            }),
            Ok(Err(failure)) => Err(failure),
            Err(_elapsed) => {
                error!(%workflow_id, %execution_id, timeout = ?self.config.run_timeout, "run exceeded its wall-clock budget");
                Err(EngineFailure {
                    instance_id: String::new(),
                    cause: FailureCause::Timeout,
                    final_state: ctx.state,
                    node_payload: None,
                })
            }
        }
    }

    fn run_sequence<'a>(
        &'a self,
        steps: &'a [AstNode],
        ctx: &'a mut RunCtx,
        inputs: Value,
    ) -> BoxFuture<'a, Result<Value, EngineFailure>> {
        Box::pin(async move {
            let mut current = inputs;
            for node in steps {
                current = self.run_node(node, ctx, current).await?;
            }
            Ok(current)
        })
    }

    fn run_node<'a>(
        &'a self,
        node: &'a AstNode,
        ctx: &'a mut RunCtx,
        inputs: Value,
    ) -> BoxFuture<'a, Result<Value, EngineFailure>> {
        Box::pin(async move {
            if node.is_loop {
                self.run_loop(node, ctx, inputs).await
            } else {
                let (edge, payload) = self.invoke(node, ctx, inputs).await?;
                match node.branches.get(&edge) {
                    Some(subgraph) => self.run_sequence(subgraph, ctx, payload).await,
                    None => Ok(payload),
                }
            }
        })
    }

    /// A re-entrant node keeps invoking itself — running its branched
    /// (re-entry) edge's subgraph between invocations and feeding that
    /// subgraph's output back in as the next invocation's input — until it
    /// emits an edge with no branch attached, which exits the loop
    /// (§4.4.2.g). Re-entering more than `loop_bound` times aborts the run.
    fn run_loop<'a>(
        &'a self,
        node: &'a AstNode,
        ctx: &'a mut RunCtx,
        inputs: Value,
    ) -> BoxFuture<'a, Result<Value, EngineFailure>> {
        Box::pin(async move {
            let mut current = inputs;
            for _ in 0..self.config.loop_bound {
                let (edge, payload) = self.invoke(node, ctx, current).await?;
                match node.branches.get(&edge) {
                    Some(subgraph) => {
                        current = self.run_sequence(subgraph, ctx, payload).await?;
                    }
                    None => return Ok(payload),
                }
            }
            Err(EngineFailure {
                instance_id: node.instance_id.clone(),
                cause: FailureCause::LoopBoundExceeded {
                    bound: self.config.loop_bound,
                },
                final_state: ctx.state.clone(),
                node_payload: None,
            })
        })
    }

    /// Invoke one node exactly once: resolve its config against the
    /// current state snapshot, dispatch through the registry, and reduce
    /// its `EdgeMap` to the single (edge, payload) pair the rest of the
    /// walk routes on.
    fn invoke<'a>(
        &'a self,
        node: &'a AstNode,
        ctx: &'a mut RunCtx,
        inputs: Value,
    ) -> BoxFuture<'a, Result<(String, Value), EngineFailure>> {
        Box::pin(async move {
            if ctx.cancellation.is_cancelled() {
                return Err(EngineFailure {
                    instance_id: node.instance_id.clone(),
                    cause: FailureCause::Cancelled,
                    final_state: ctx.state.clone(),
                    node_payload: None,
                });
            }

            ctx.steps_executed += 1;

            let state_snapshot = Value::Object(ctx.state.clone());
            let resolved_config = state::resolve_config(&node.config, &state_snapshot, &inputs);

            let instance = self.registry.create(&node.node_type).map_err(|e| EngineFailure {
                instance_id: node.instance_id.clone(),
                cause: FailureCause::NodeError { message: e.to_string() },
                final_state: ctx.state.clone(),
                node_payload: None,
            })?;

            let mut exec_ctx = ExecutionContext {
                workflow_id: ctx.workflow_id,
                execution_id: ctx.execution_id,
                node_id: node.instance_id.clone(),
                state: &mut ctx.state,
                inputs,
            };

            let edge_map = self
                .execute_with_retry(&node.instance_id, instance.as_ref(), &mut exec_ctx, resolved_config)
                .await
                .map_err(|cause| EngineFailure {
                    instance_id: node.instance_id.clone(),
                    cause,
                    final_state: ctx.state.clone(),
                    node_payload: None,
                })?;

            match edge_map.into_single() {
                Some((edge, payload_future)) => {
                    let payload = payload_future.await;
                    Ok((edge, payload))
                }
                None => Err(EngineFailure {
                    instance_id: node.instance_id.clone(),
                    cause: FailureCause::NodeError {
                        message: "node completed without emitting any edge".to_string(),
                    },
                    final_state: ctx.state.clone(),
                    node_payload: None,
                }),
            }
        })
    }

    async fn execute_with_retry(
        &self,
        instance_id: &str,
        node: &dyn ExecutableNode,
        ctx: &mut ExecutionContext<'_>,
        config: Value,
    ) -> Result<nodes::EdgeMap, FailureCause> {
        let mut attempts = 0u32;

        loop {
            match node.execute(ctx, config.clone()).await {
                Ok(edges) => return Ok(edges),

                Err(NodeError::Fatal(message)) => {
                    error!(instance_id, %message, "node failed fatally");
                    return Err(FailureCause::NodeError { message });
                }

                Err(NodeError::Retryable(message)) => {
                    attempts += 1;
                    if attempts > self.config.max_retries {
                        error!(instance_id, attempts, %message, "node retries exhausted");
                        return Err(FailureCause::NodeError { message });
                    }

                    let delay = self.config.retry_base_delay * 2u32.pow(attempts.saturating_sub(1));
                    warn!(
                        instance_id,
                        attempts,
                        max_retries = self.config.max_retries,
                        ?delay,
                        %message,
                        "retrying node after retryable error"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use nodes::mock::MockNode;
    use nodes::{EdgeMap, NodeDescriptor};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn bare(instance_id: &str, node_type: &str) -> AstNode {
        AstNode {
            instance_id: instance_id.to_string(),
            node_type: node_type.to_string(),
            is_loop: false,
            config: json!({}),
            branches: IndexMap::new(),
        }
    }

    fn ast_of(steps: Vec<AstNode>) -> Ast {
        Ast {
            steps,
            initial_state: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn linear_sequence_runs_every_node_in_order() {
        let registry = NodeRegistry::new();
        registry
            .register(NodeDescriptor::new("a", "a", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::returning("a", json!({})))
            })
            .unwrap();
        registry
            .register(NodeDescriptor::new("b", "b", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::returning("b", json!({})))
            })
            .unwrap();

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let ast = ast_of(vec![bare("workflow[0]", "a"), bare("workflow[1]", "b")]);

        let outcome = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap();
        assert_eq!(outcome.final_state["a_ran"], json!(true));
        assert_eq!(outcome.final_state["b_ran"], json!(true));
        assert_eq!(outcome.steps_executed, 2);
    }

    #[tokio::test]
    async fn branch_routes_into_the_matching_edge_subgraph() {
        let registry = NodeRegistry::new();
        registry
            .register(
                NodeDescriptor::new("decision", "decision", "1.0.0", vec!["big".into(), "small".into()]),
                || Arc::new(MockNode::emitting("decision", "big", json!({}))),
            )
            .unwrap();
        registry
            .register(NodeDescriptor::new("on-big", "on-big", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::returning("on-big", json!({})))
            })
            .unwrap();

        let mut branches = IndexMap::new();
        branches.insert("big".to_string(), vec![bare("workflow[0].big?[0]", "on-big")]);
        let decision = AstNode {
            instance_id: "workflow[0]".into(),
            node_type: "decision".into(),
            is_loop: false,
            config: json!({}),
            branches,
        };

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let ast = ast_of(vec![decision]);
        let outcome = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap();
        assert_eq!(outcome.final_state["on-big_ran"], json!(true));
    }

    #[tokio::test]
    async fn unbranched_edge_skips_straight_to_the_next_top_level_step() {
        let registry = NodeRegistry::new();
        registry
            .register(
                NodeDescriptor::new("decision", "decision", "1.0.0", vec!["big".into(), "small".into()]),
                || Arc::new(MockNode::emitting("decision", "small", json!({}))),
            )
            .unwrap();
        registry
            .register(NodeDescriptor::new("after", "after", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::returning("after", json!({})))
            })
            .unwrap();

        let mut branches = IndexMap::new();
        branches.insert("big".to_string(), vec![bare("workflow[0].big?[0]", "after")]);
        let decision = AstNode {
            instance_id: "workflow[0]".into(),
            node_type: "decision".into(),
            is_loop: false,
            config: json!({}),
            branches,
        };

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let ast = ast_of(vec![decision, bare("workflow[1]", "after")]);
        let outcome = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap();
        assert_eq!(outcome.final_state["after_ran"], json!(true));
    }

    #[tokio::test]
    async fn fatal_node_error_aborts_the_run() {
        let registry = NodeRegistry::new();
        registry
            .register(NodeDescriptor::new("boom", "boom", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::failing_fatal("boom", "exploded"))
            })
            .unwrap();

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let ast = ast_of(vec![bare("workflow[0]", "boom")]);
        let err = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err.cause, FailureCause::NodeError { .. }));
        assert_eq!(err.instance_id, "workflow[0]");
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_node_eventually_exhausts_and_aborts() {
        let registry = NodeRegistry::new();
        registry
            .register(
                NodeDescriptor::new("flaky", "flaky", "1.0.0", vec!["success".into()]),
                || Arc::new(MockNode::failing_retryable("flaky", "transient")),
            )
            .unwrap();

        let config = ExecutorConfig {
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1),
            loop_bound: 10,
            ..ExecutorConfig::default()
        };
        let executor = WorkflowExecutor::new(registry, config);
        let ast = ast_of(vec![bare("workflow[0]", "flaky")]);

        let handle = tokio::spawn(async move { executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await });
        tokio::time::advance(Duration::from_secs(5)).await;
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err.cause, FailureCause::NodeError { .. }));
    }

    /// A loop node that emits `"again"` a fixed number of times, then
    /// `"stop"`. Unlike `MockNode`, its emitted edge varies per call, which
    /// is what exercises genuine loop re-entry.
    struct CountingLoopNode {
        limit: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ExecutableNode for CountingLoopNode {
        async fn execute(
            &self,
            ctx: &mut ExecutionContext<'_>,
            _config: Value,
        ) -> Result<EdgeMap, NodeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            ctx.state.insert("iterations".to_string(), json!(n));
            if n < self.limit {
                Ok(EdgeMap::single_value("again", json!({})))
            } else {
                Ok(EdgeMap::single_value("stop", json!({})))
            }
        }
    }

    #[tokio::test]
    async fn loop_node_re_enters_until_terminal_edge_then_exits() {
        let registry = NodeRegistry::new();
        registry
            .register(
                NodeDescriptor::new("counting-loop", "counting-loop", "1.0.0", vec!["again".into(), "stop".into()]),
                || {
                    Arc::new(CountingLoopNode {
                        limit: 3,
                        calls: AtomicU32::new(0),
                    })
                },
            )
            .unwrap();

        let mut branches = IndexMap::new();
        branches.insert("again".to_string(), Vec::new());
        let loop_node = AstNode {
            instance_id: "workflow[0]".into(),
            node_type: "counting-loop".into(),
            is_loop: true,
            config: json!({}),
            branches,
        };

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let ast = ast_of(vec![loop_node]);
        let outcome = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap();
        assert_eq!(outcome.final_state["iterations"], json!(3));
    }

    #[tokio::test]
    async fn loop_exceeding_bound_aborts_as_loop_bound_exceeded() {
        let registry = NodeRegistry::new();
        registry
            .register(
                NodeDescriptor::new("never-stops", "never-stops", "1.0.0", vec!["again".into(), "stop".into()]),
                || Arc::new(MockNode::emitting("never-stops", "again", json!({}))),
            )
            .unwrap();

        let mut branches = IndexMap::new();
        branches.insert("again".to_string(), Vec::new());
        let loop_node = AstNode {
            instance_id: "workflow[0]".into(),
            node_type: "never-stops".into(),
            is_loop: true,
            config: json!({}),
            branches,
        };

        let config = ExecutorConfig {
            loop_bound: 5,
            ..ExecutorConfig::default()
        };
        let executor = WorkflowExecutor::new(registry, config);
        let ast = ast_of(vec![loop_node]);
        let err = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err.cause, FailureCause::LoopBoundExceeded { bound: 5 }));
    }

    #[tokio::test]
    async fn template_reference_resolves_against_state_written_by_a_prior_node() {
        let registry = NodeRegistry::new();
        registry
            .register(NodeDescriptor::new("producer", "producer", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::returning("producer", json!({ "value": 7 })))
            })
            .unwrap();

        struct EchoNode;
        #[async_trait]
        impl ExecutableNode for EchoNode {
            async fn execute(&self, ctx: &mut ExecutionContext<'_>, config: Value) -> Result<EdgeMap, NodeError> {
                ctx.state.insert("echoed".to_string(), config["seen"].clone());
                Ok(EdgeMap::single_value("success", json!({})))
            }
        }
        registry
            .register(NodeDescriptor::new("echo", "echo", "1.0.0", vec!["success".into()]), || Arc::new(EchoNode))
            .unwrap();

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let mut echo = bare("workflow[1]", "echo");
        echo.config = json!({ "seen": "$.value" });
        let ast = ast_of(vec![bare("workflow[0]", "producer"), echo]);

        let outcome = executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await.unwrap();
        assert_eq!(outcome.final_state["echoed"], json!(7));
    }

    /// A node that never returns, so the wall-clock timeout has to be the
    /// thing that aborts the run.
    struct HangingNode;

    #[async_trait]
    impl ExecutableNode for HangingNode {
        async fn execute(&self, _ctx: &mut ExecutionContext<'_>, _config: Value) -> Result<EdgeMap, NodeError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_exceeding_its_timeout_aborts_with_timeout_cause() {
        let registry = NodeRegistry::new();
        registry
            .register(NodeDescriptor::new("hangs", "hangs", "1.0.0", vec!["success".into()]), || {
                Arc::new(HangingNode)
            })
            .unwrap();

        let config = ExecutorConfig {
            run_timeout: Duration::from_millis(50),
            ..ExecutorConfig::default()
        };
        let executor = WorkflowExecutor::new(registry, config);
        let ast = ast_of(vec![bare("workflow[0]", "hangs")]);

        let handle = tokio::spawn(async move { executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None).await });
        tokio::time::advance(Duration::from_secs(5)).await;
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err.cause, FailureCause::Timeout));
    }

    #[tokio::test]
    async fn cancelling_the_token_before_a_node_runs_aborts_with_cancelled_cause() {
        let registry = NodeRegistry::new();
        registry
            .register(NodeDescriptor::new("a", "a", "1.0.0", vec!["success".into()]), || {
                Arc::new(MockNode::returning("a", json!({})))
            })
            .unwrap();

        let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
        let ast = ast_of(vec![bare("workflow[0]", "a")]);

        let token = CancellationToken::new();
        token.cancel();

        let err = executor
            .run_cancellable(&ast, Uuid::new_v4(), Uuid::new_v4(), None, token)
            .await
            .unwrap_err();
        assert!(matches!(err.cause, FailureCause::Cancelled));
    }
}

/// Property-based checks for §8's universal invariants: loop termination
/// stays bounded by `loop_bound` regardless of how many iterations a loop
/// body actually wants, and a top-level sequence's state is exactly the
/// composition of each step's own mutation (no step sees a stale or
/// partially-applied predecessor state).
#[cfg(test)]
mod proptests {
    use super::*;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use nodes::{EdgeMap, NodeDescriptor};
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn bare(instance_id: &str, node_type: &str) -> AstNode {
        AstNode {
            instance_id: instance_id.to_string(),
            node_type: node_type.to_string(),
            is_loop: false,
            config: json!({}),
            branches: IndexMap::new(),
        }
    }

    /// Emits `again` for `wants - 1` calls, then `stop`.
    struct WantsNIterations {
        wants: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ExecutableNode for WantsNIterations {
        async fn execute(&self, ctx: &mut ExecutionContext<'_>, _config: Value) -> Result<EdgeMap, NodeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            ctx.state.insert("iterations".to_string(), json!(n));
            if n < self.wants {
                Ok(EdgeMap::single_value("again", json!({})))
            } else {
                Ok(EdgeMap::single_value("stop", json!({})))
            }
        }
    }

    fn loop_ast() -> Ast {
        let mut branches = IndexMap::new();
        branches.insert("again".to_string(), Vec::new());
        Ast {
            steps: vec![AstNode {
                instance_id: "workflow[0]".into(),
                node_type: "wants-n".into(),
                is_loop: true,
                config: json!({}),
                branches,
            }],
            initial_state: serde_json::Map::new(),
        }
    }

    proptest! {
        /// A loop that wants fewer re-entries than `loop_bound` always
        /// completes with exactly that many, never hitting the bound.
        #[test]
        fn loop_terminating_within_bound_always_succeeds(wants in 1u32..200, bound in 200u32..1000) {
            let registry = NodeRegistry::new();
            registry
                .register(NodeDescriptor::new("wants-n", "wants-n", "1.0.0", vec!["again".into(), "stop".into()]), move || {
                    Arc::new(WantsNIterations { wants, calls: AtomicU32::new(0) })
                })
                .unwrap();

            let executor = WorkflowExecutor::new(registry, ExecutorConfig { loop_bound: bound, ..ExecutorConfig::default() });
            let ast = loop_ast();

            let outcome = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None))
                .expect("loop within bound must not fail");

            prop_assert_eq!(outcome.final_state["iterations"], json!(wants));
        }

        /// A loop that wants more re-entries than `loop_bound` is always
        /// rejected as `LoopBoundExceeded`, never silently truncated or
        /// allowed to run forever.
        #[test]
        fn loop_exceeding_bound_always_fails_with_loop_bound_exceeded(bound in 1u32..50) {
            let registry = NodeRegistry::new();
            registry
                .register(NodeDescriptor::new("wants-n", "wants-n", "1.0.0", vec!["again".into(), "stop".into()]), || {
                    Arc::new(WantsNIterations { wants: u32::MAX, calls: AtomicU32::new(0) })
                })
                .unwrap();

            let executor = WorkflowExecutor::new(registry, ExecutorConfig { loop_bound: bound, ..ExecutorConfig::default() });
            let ast = loop_ast();

            let err = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None))
                .expect_err("loop past bound must fail");

            prop_assert!(matches!(err.cause, FailureCause::LoopBoundExceeded { bound: b } if b == bound));
        }

        /// State continuity (§8 property 2): a top-level sequence of `n`
        /// mock nodes, each stamping its own key, ends with every stamp
        /// present — no step's mutation is lost or overwritten by the
        /// engine's own bookkeeping.
        #[test]
        fn sequential_steps_each_leave_their_stamp_in_final_state(n in 1usize..12) {
            let registry = NodeRegistry::new();
            let mut steps = Vec::with_capacity(n);
            for i in 0..n {
                let node_type = format!("stamp-{i}");
                registry
                    .register(NodeDescriptor::new(node_type.clone(), node_type.clone(), "1.0.0", vec!["success".into()]), {
                        let node_type = node_type.clone();
                        move || Arc::new(nodes::mock::MockNode::returning(node_type.clone(), json!({})))
                    })
                    .unwrap();
                steps.push(bare(&format!("workflow[{i}]"), &node_type));
            }

            let executor = WorkflowExecutor::new(registry, ExecutorConfig::default());
            let ast = Ast { steps, initial_state: serde_json::Map::new() };

            let outcome = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(executor.run(&ast, Uuid::new_v4(), Uuid::new_v4(), None))
                .expect("a linear sequence of well-behaved nodes must not fail");

            for i in 0..n {
                prop_assert_eq!(&outcome.final_state[&format!("stamp-{i}_ran")], &json!(true));
            }
        }
    }
}
