//! # netwatch
//!
//! An interactive network health dashboard over flow telemetry stored in
//! ClickHouse.
//!
//! The crate turns the aggregations in [`netwatch_store`] into a small tool
//! surface, serves it to hosts over JSON-RPC, and ships a terminal client
//! that drives the same tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  host / model                     terminal client            │
//! │      │                      ┌───────┐   ┌───────┐            │
//! │      ▼                      │  app  │──▶│  ui   │            │
//! │  ┌────────┐                 │(state)│   └───────┘            │
//! │  │ server │  HTTP / stdio   └───┬───┘                        │
//! │  └───┬────┘                     ▼                            │
//! │      │                     ┌──────────┐                      │
//! │      │    ◀── HttpTransport│  client  │LocalTransport ──┐    │
//! │      ▼                     └──────────┘                 │    │
//! │  ┌────────┐                                             │    │
//! │  │ tools  │◀────────────────────────────────────────────┘    │
//! │  └───┬────┘                                                  │
//! │      ▼                                                       │
//! │  TelemetryAggregator ──▶ ClickHouse                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`tools`]**: the three tools, their visibility rules and wire encoding
//! - **[`server`]**: JSON-RPC dispatch with HTTP and stdio transports
//! - **[`resource`]**: the HTML bundle hosts embed as the dashboard
//! - **[`state`]**: the client view state machine, a pure reducer
//! - **[`client`]**: tool transports and the command dispatcher
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the terminal dashboard
//! - **[`config`]**: layered settings from defaults, file and environment
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Serve the tools to a host over HTTP
//! netwatch serve --port 8002
//!
//! # Terminal dashboard against a running server
//! netwatch tui --connect http://localhost:8002/mcp --auto-refresh
//! ```
//!
//! ### Driving the view state
//!
//! ```
//! use netwatch::state::{Command, DashboardState, Msg};
//! use netwatch::tools::ToolRequest;
//! use netwatch_types::Filter;
//!
//! let mut state = DashboardState::new(Filter::last_hours(6));
//! let commands = state.start();
//! assert_eq!(
//!     commands,
//!     vec![Command::Fetch(ToolRequest::RefreshDashboard(Filter::last_hours(6)))]
//! );
//!
//! let commands = state.update(Msg::ApplicationSelected("DNS".into()));
//! assert_eq!(commands.len(), 1);
//! ```
//!
//! ### Calling the tools in-process
//!
//! ```
//! use std::sync::Arc;
//! use netwatch::tools::{CallerClass, ToolSurface};
//! use netwatch_store::{ScriptedStore, TelemetryAggregator};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let tools = ToolSurface::new(TelemetryAggregator::new(Arc::new(ScriptedStore::new())));
//! let response = tools
//!     .call(CallerClass::Agent, "show_network_dashboard", &json!({"timeWindowHours": 6}))
//!     .await
//!     .unwrap();
//! assert!(response.snapshot().is_some());
//! # });
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod events;
pub mod resource;
pub mod server;
pub mod state;
pub mod tools;
pub mod ui;

pub use app::App;
pub use client::{Dispatcher, HttpTransport, LocalTransport, ToolTransport, TransportError};
pub use config::Settings;
pub use server::McpServer;
pub use state::{Command, DashboardState, Msg};
pub use tools::{CallerClass, ToolError, ToolRequest, ToolResponse, ToolSurface};
