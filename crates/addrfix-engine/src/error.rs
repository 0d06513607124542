use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid page URL \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
