use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginate {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response<S: Serialize> {
    pub response_type: String,
    pub response: S,
}

/// Row counts across the whole ledger.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsReport {
    pub owners: u64,
    pub submissions: u64,
    pub votes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "message_type", content = "data")]
pub enum SocketMessage<S: Serialize> {
    ListSubmissions {
        owner_id: Option<i64>,
        options: Option<Paginate>,
    },
    ReadSubmission {
        id: i32,
    },
    ListVoters {
        id: i32,
        options: Option<Paginate>,
    },
    ReadSettings {
        owner_id: i64,
    },
    Stats,
    Response(Response<S>),
    Error(Response<S>),
}
