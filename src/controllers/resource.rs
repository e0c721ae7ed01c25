use super::{Action, Verb};
use crate::dao::{Dao, Outcome};
use crate::error::DispatchResult;
use crate::params::UrlParams;
use crate::router::reverse;
use crate::server::CrudRequest;

pub(super) const ACTIONS: [(Verb, Action); 2] = [
    (Verb::Get, Action::new("query", query)),
    (Verb::Post, Action::new("create", create)),
];

fn query(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.query(url_params, &req.query)
}

/// 201 with the stored resource and a `Location` pointing at it.
fn create(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    let body = req.deserialize_body()?;
    let created = dao.create(url_params, body)?;
    let pk = if created.is_null() {
        None
    } else {
        Some(dao.get_pk(&created)?)
    };
    let location = reverse(&req.path, pk.as_deref());
    let res = req
        .serialized_response(&created)?
        .with_status(201)
        .with_header("Location", location);
    Ok(Outcome::Response(res))
}
