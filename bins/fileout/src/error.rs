use fileout_output_file::FileOutputError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("file output: {0}")]
    Output(#[from] FileOutputError),

    #[error("input '{path}': {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} batches failed to write")]
    Incomplete { failed: usize, total: usize },
}
