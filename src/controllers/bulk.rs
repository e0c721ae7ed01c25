use super::{body_items, Action, Verb};
use crate::dao::{Dao, Outcome};
use crate::error::DispatchResult;
use crate::params::UrlParams;
use crate::server::CrudRequest;

// The array is forwarded untouched; ordering and partial failure belong to the DAO.
pub(super) const ACTIONS: [(Verb, Action); 4] = [
    (Verb::Post, Action::new("bulk_create", bulk_create)),
    (Verb::Put, Action::new("bulk_update", bulk_update)),
    (Verb::Patch, Action::new("bulk_patch", bulk_patch)),
    (Verb::Delete, Action::new("bulk_delete", bulk_delete)),
];

fn bulk_create(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.bulk_create(url_params, body_items(req)?)
}

fn bulk_update(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.bulk_update(url_params, body_items(req)?)
}

fn bulk_patch(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.bulk_patch(url_params, body_items(req)?)
}

fn bulk_delete(dao: &dyn Dao, req: &CrudRequest, url_params: &UrlParams) -> DispatchResult<Outcome> {
    dao.bulk_delete(url_params, body_items(req)?)
}
