//! Request extractors whose rejections use the JSON error body.

use axum::{
    Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use axum_extra::extract::WithRejection;

use crate::ServerError;

pub(crate) type JsonBody<T> = WithRejection<Json<T>, ServerError>;
pub(crate) type PathParams<T> = WithRejection<Path<T>, ServerError>;
pub(crate) type QueryParams<T> = WithRejection<Query<T>, ServerError>;

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejection {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejection {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejection {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
