#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parse Error: {0}")]
    Parse(String),
    #[error("Binning Error: {0}")]
    Binning(String),
    #[error("Connection Error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Write Error: {0}")]
    Write(#[source] sqlx::Error),
    #[error("Data Error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
