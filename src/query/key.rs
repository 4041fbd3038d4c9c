use std::fmt;

const ROOT: &str = "orchestrator";
const PROCESSES: &str = "processes";

/// Address of a cached query: operation name followed by its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Prefix shared by every process query; invalidating it refreshes all lists.
    pub fn processes() -> Self {
        Self::new([ROOT, PROCESSES])
    }

    pub fn process_list(folder_id: Option<i64>) -> Self {
        let folder = match folder_id {
            Some(id) => format!("folder={id}"),
            None => "folder=*".to_string(),
        };
        Self::processes().with(folder)
    }

    pub fn process(process_id: i64, folder_id: i64) -> Self {
        Self::processes()
            .with(format!("id={process_id}"))
            .with(format!("folder={folder_id}"))
    }

    pub fn with(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}
