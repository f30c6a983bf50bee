//! Dashboard panels.
//!
//! DESIGN
//! ======
//! Every panel owns a `ViewScope`, its feeds and action guards, and a notice
//! slot. Panels never read each other's state. The chat panel is the one
//! exception on the input side: it takes the connectivity receiver and may
//! share the cloud panel's mood slot.
//!
//! ERROR HANDLING
//! ==============
//! Action helpers here return `ActionError::Closed` when the owning scope
//! closed while the request was in flight, so callers never apply a late
//! result. Everything else surfaces as `ActionError::Api`.

pub mod advanced;
pub mod auto_learning;
pub mod chat;
pub mod cloud;
pub mod dictionary;
pub mod learning;
pub mod search;
pub mod training;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::action::ActionError;
use crate::net::envelope::adapt;
use crate::net::{Shape, Transport};
use crate::scope::Liveness;

/// POST `path` and adapt the reply with `shape`.
pub(crate) async fn post<T>(
    transport: &dyn Transport,
    liveness: &Liveness,
    path: &str,
    body: Option<Value>,
    shape: Shape,
) -> Result<T, ActionError>
where
    T: DeserializeOwned + Default,
{
    let reply = transport.post_json(path, body).await;
    if !liveness.is_alive() {
        return Err(ActionError::Closed);
    }
    Ok(adapt(shape, path, reply?)?)
}

/// GET `path` and adapt the reply with `shape`.
pub(crate) async fn get<T>(transport: &dyn Transport, liveness: &Liveness, path: &str, shape: Shape) -> Result<T, ActionError>
where
    T: DeserializeOwned + Default,
{
    let reply = transport.get_json(path).await;
    if !liveness.is_alive() {
        return Err(ActionError::Closed);
    }
    Ok(adapt(shape, path, reply?)?)
}
