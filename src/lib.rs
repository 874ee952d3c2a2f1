//! # Agentloom: Graph-driven Agent Service
//!
//! Agentloom runs LLM-backed agents as concurrent, stateful workflow
//! graphs and serves them over an authenticated HTTP API with server-sent
//! event streaming.
//!
//! ## Core Concepts
//!
//! - **Nodes**: Async units of work that process state snapshots
//! - **Messages**: Transcript entries with role-based typing
//! - **State**: Versioned, channel-based state management
//! - **Graph**: Declarative workflow definition with conditional edges
//! - **Scheduler**: Concurrent execution with version-gated supersteps
//! - **Agents**: Named, compiled graphs the server runs per request
//!
//! ## Quick Start
//!
//! ### Working with Messages
//!
//! Messages are the transcript primitive. Use convenience constructors:
//!
//! ```
//! use agentloom::message::Message;
//!
//! let user_msg = Message::user("What's the weather like?");
//! let assistant_msg = Message::assistant("It's sunny, 22°C!");
//! let system_msg = Message::system("You are a helpful assistant.");
//! let tool_msg = Message::tool("The weather in Tokyo is sunny, 22°C.");
//!
//! // Use role constants for consistency
//! let user_msg2 = Message::new(Message::USER, "Another user message");
//!
//! assert!(user_msg.has_role(Message::USER));
//! assert!(!user_msg.has_role(Message::ASSISTANT));
//! ```
//!
//! ### Building a Workflow
//!
//! ```
//! use agentloom::{
//!     graphs::GraphBuilder,
//!     message::Message,
//!     node::{Node, NodeContext, NodePartial},
//!     state::{StateSnapshot, VersionedState},
//!     types::NodeKind,
//! };
//! use async_trait::async_trait;
//!
//! struct GreetingNode;
//!
//! #[async_trait]
//! impl Node for GreetingNode {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<NodePartial, agentloom::node::NodeError> {
//!         let greeting = Message::assistant("Hello! How can I help you today?");
//!         Ok(NodePartial::new().with_messages(vec![greeting]))
//!     }
//! }
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("greet".into()), GreetingNode)
//!     .add_edge(NodeKind::Start, NodeKind::Custom("greet".into()))
//!     .add_edge(NodeKind::Custom("greet".into()), NodeKind::End)
//!     .compile()
//!     .unwrap();
//! assert_eq!(app.nodes().len(), 1);
//! ```
//!
//! ### State Management
//!
//! ```
//! use agentloom::state::VersionedState;
//!
//! // Initial state with a single user message
//! let state = VersionedState::new_with_user_message("Hello!");
//!
//! // Or the builder for richer initialization
//! let complex_state = VersionedState::builder()
//!     .with_user_message("What's the weather?")
//!     .with_system_message("You are a weather assistant")
//!     .with_extra("location", serde_json::json!("Tokyo"))
//!     .build();
//! ```
//!
//! ## Module Guide
//!
//! - [`message`] - Transcript message types and construction utilities
//! - [`state`] - Versioned state management and snapshots
//! - [`node`] - Node trait and execution primitives
//! - [`graphs`] - Workflow graph definition and compilation
//! - [`schedulers`] - Concurrent execution and version gating
//! - [`runtimes`] - Session runner and runtime configuration
//! - [`channels`] - Channel-based state storage and versioning
//! - [`reducers`] - State merge strategies
//! - [`event_bus`] - Run event fan-out, sinks, and streaming
//! - [`agents`] - LLM chat agents, tools, and the agent registry
//! - [`auth`] - Bearer-token verification and minting
//! - [`store`] - Postgres-backed user profiles
//! - [`server`] - HTTP API and SSE streaming
//! - [`config`] - Environment-driven settings

pub mod agents;
pub mod app;
pub mod auth;
pub mod channels;
pub mod config;
pub mod control;
pub mod event_bus;
pub mod graphs;
pub mod message;
pub mod node;
pub mod reducers;
pub mod runtimes;
pub mod schedulers;
pub mod server;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use control::{FrontierCommand, NodeRoute};
