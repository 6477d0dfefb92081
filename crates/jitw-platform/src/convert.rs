//! Conversions between the wire types (`proto::*`) and the platform-agnostic
//! core types (`jitw_core::*`).

use crate::proto;
use jitw_core::{AccessRequest, RequestState, ResourceRef};

pub(crate) fn resource_from_proto(r: proto::ResourceRef) -> ResourceRef {
    ResourceRef {
        kind: r.kind,
        name: r.name,
        cluster: (!r.cluster.is_empty()).then_some(r.cluster),
        sub_kind: (!r.sub_kind.is_empty()).then_some(r.sub_kind),
    }
}

pub(crate) fn state_from_proto(s: &str) -> RequestState {
    match s {
        "PENDING" => RequestState::Pending,
        "APPROVED" => RequestState::Approved,
        "DENIED" => RequestState::Denied,
        other => RequestState::Other(other.to_string()),
    }
}

pub(crate) fn request_from_proto(r: proto::AccessRequest) -> AccessRequest {
    AccessRequest {
        id: r.id,
        user: r.user,
        roles: r.roles,
        resources: r.resources.into_iter().map(resource_from_proto).collect(),
        created_at_ms: r.created_at_ms,
        state: state_from_proto(&r.state),
    }
}
