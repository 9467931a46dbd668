// Lungora Console - admin client for the Lungora triage platform
//
// The library holds everything the `lungora` binary drives:
// - Storage: durable and session-scoped key-value scopes plus the credential store
// - HTTP: request pipeline built from explicit middleware (bearer + 401 refresh)
// - Auth: backend auth calls and the single-flight refresh coordinator
// - Session: in-memory session context and its lifecycle controller
// - Collection: search / filter / sort / paginate over fetched lists
// - API: typed calls for users, doctors, categories, articles, history, inference

pub mod api;
pub mod app;
pub mod auth;
pub mod collection;
pub mod config;
pub mod http;
pub mod logging;
pub mod notice;
pub mod session;
pub mod storage;
pub mod util;
