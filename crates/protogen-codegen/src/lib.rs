//! protogen-codegen - Artifacts generated from a protogen schema package
//!
//! Two generators consume a [`Package`](protogen_core::Package) produced by
//! the transformer:
//! - [`render_proto`]: the proto3 schema file
//! - [`generate_service`]: tonic-style service glue as `syn` declarations,
//!   rendered to source with [`render_service`]
//!
//! ```text
//! Package
//!   ├─→ [render_proto]     → generated.proto
//!   └─→ [generate_service] → ServiceDecls → [render_service] → service.rs
//! ```
//!
//! Both generators are total: any package the transformer can produce
//! yields output.

mod proto;
mod rpc;

pub use proto::render_proto;
pub use rpc::{ServiceDecls, ServiceNames, generate_service, render_service};
