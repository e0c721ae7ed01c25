use super::{Action, Verb};
use crate::dao::{Dao, Outcome};
use crate::error::DispatchResult;
use crate::params::UrlParams;
use crate::server::{CrudRequest, Response};

pub(super) const ACTIONS: [(Verb, Action); 4] = [
    (Verb::Get, Action::new("get", get)),
    (Verb::Put, Action::new("update", update)),
    (Verb::Patch, Action::new("patch", patch)),
    (Verb::Delete, Action::new("delete", delete)),
];

fn get(dao: &dyn Dao, _req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.get(url_params).map(Outcome::Data)
}

fn update(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    let body = req.deserialize_body()?;
    dao.update(url_params, body).map(Outcome::Data)
}

fn patch(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    let body = req.deserialize_body()?;
    dao.patch(url_params, body).map(Outcome::Data)
}

fn delete(dao: &dyn Dao, _req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.delete(url_params)?;
    Ok(Outcome::Response(Response::empty(204)))
}
