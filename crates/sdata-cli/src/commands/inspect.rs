use anyhow::Result;
use sdata_uri::{DialectConfig, ProtocolUri};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryArgReport {
    pub name: String,
    pub value: String,
}

/// Typed protocol view of the URI
#[derive(Debug, Serialize)]
pub struct ProtocolReport {
    pub product: Option<String>,
    pub contract: Option<String>,
    pub company_dataset: Option<String>,
    pub collection_type: Option<String>,
    pub collection_predicate: Option<String>,
    pub service_method: Option<String>,
    pub format: String,
    pub where_clause: Option<String>,
    pub order_by: Vec<String>,
    pub select: Vec<String>,
    pub start_index: Option<i64>,
    pub count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UriReport {
    pub uri: String,
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub server: String,
    pub path: String,
    pub segments: Vec<SegmentReport>,
    pub query: Vec<QueryArgReport>,
    pub fragment: String,
    pub protocol: ProtocolReport,
}

impl UriReport {
    pub fn from_uri(uri: &ProtocolUri) -> Self {
        Self {
            uri: uri.uri(),
            scheme: uri.scheme(),
            host: uri.host(),
            port: uri.port(),
            server: uri.server(),
            path: uri.path(),
            segments: uri
                .segments()
                .iter()
                .map(|segment| SegmentReport {
                    text: segment.text(),
                    predicate: segment.predicate(),
                })
                .collect(),
            query: uri
                .query_args()
                .iter()
                .map(|(name, value)| QueryArgReport {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            fragment: uri.fragment(),
            protocol: ProtocolReport {
                product: uri.product(),
                contract: uri.contract(),
                company_dataset: uri.company_dataset(),
                collection_type: uri.collection_type(),
                collection_predicate: uri.collection_predicate(),
                service_method: uri.service_method(),
                format: uri.format().to_string(),
                where_clause: uri.where_clause(),
                order_by: uri.order_by().iter().map(ToString::to_string).collect(),
                select: uri.select(),
                start_index: uri.start_index(),
                count: uri.count(),
            },
        }
    }
}

/// Render the report for `uri` as JSON
pub fn execute(dialect: &DialectConfig, uri: &str, compact: bool) -> Result<String> {
    let uri = ProtocolUri::with_dialect(uri, dialect);
    let report = UriReport::from_uri(&uri);
    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    Ok(json)
}
