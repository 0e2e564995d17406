use anyhow::{Context, Result, bail};
use facetnav::{HttpApi, JsonBodyReader, MemoryBackend, QueryReader, Route, SortSpec, backend::load_indices};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "facetnav.toml";

/// Loaded configuration plus the directory relative paths resolve against
pub struct ProjectContext {
    pub config_path: PathBuf,
    pub base_dir: PathBuf,
    pub config: FacetnavConfig,
}

/// Configuration stored in facetnav.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetnavConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub sort: Vec<SortSettings>,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteSettings>,
}

impl Default for FacetnavConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            data: DataSettings::default(),
            sort: Vec::new(),
            routes: default_routes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// JSON file mapping index names to arrays of documents
    #[serde(default = "default_fixture")]
    pub fixture: String,
    #[serde(default)]
    pub facets: Vec<String>,
    #[serde(default = "default_sort_param")]
    pub sort_param: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            fixture: default_fixture(),
            facets: Vec::new(),
            sort_param: default_sort_param(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSettings {
    pub name: String,
    pub field: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSettings {
    pub pattern: String,
    #[serde(default)]
    pub indices: Vec<String>,
    #[serde(default = "default_readers")]
    pub readers: Vec<ReaderKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    Query,
    Json,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_fixture() -> String {
    "catalog.json".to_string()
}

fn default_sort_param() -> String {
    "sort".to_string()
}

fn default_page_size() -> u64 {
    25
}

fn default_max_page_size() -> u64 {
    100
}

fn default_ascending() -> bool {
    true
}

fn default_readers() -> Vec<ReaderKind> {
    vec![ReaderKind::Query]
}

fn default_routes() -> Vec<RouteSettings> {
    vec![RouteSettings {
        pattern: "/search".to_string(),
        indices: Vec::new(),
        readers: default_readers(),
    }]
}

impl ProjectContext {
    /// Load from an explicit path, or from facetnav.toml in the current directory.
    ///
    /// A missing default file falls back to built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::from_path(path.to_path_buf())
            }
            None => {
                let current_dir = std::env::current_dir().context("Failed to get current directory")?;
                Self::from_path(current_dir.join(DEFAULT_CONFIG_FILE))
            }
        }
    }

    pub fn from_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            FacetnavConfig::default()
        };

        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            config_path,
            base_dir,
            config,
        })
    }

    pub fn fixture_path(&self) -> PathBuf {
        self.base_dir.join(&self.config.data.fixture)
    }

    /// Build the in-memory backend described by the [data] and [[sort]] sections.
    pub fn build_backend(&self) -> Result<MemoryBackend> {
        let path = self.fixture_path();
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let fixture: serde_json::Value =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        let indices = load_indices(fixture).with_context(|| format!("Invalid fixture {}", path.display()))?;

        let data = &self.config.data;
        let mut backend = MemoryBackend::new()
            .with_indices(indices)
            .with_sort_param(&data.sort_param)
            .with_page_sizes(data.default_page_size, data.max_page_size);
        for facet in &data.facets {
            backend = backend.with_facet(facet);
        }
        for sort in &self.config.sort {
            backend = backend.with_sort(SortSpec::new(&sort.name, &sort.field, sort.ascending));
        }
        Ok(backend)
    }

    pub fn routes(&self) -> Vec<Route> {
        self.config
            .routes
            .iter()
            .map(|settings| {
                let mut route = Route::new(&settings.pattern).with_indices(&settings.indices);
                for reader in &settings.readers {
                    route = match reader {
                        ReaderKind::Query => route.with_reader(QueryReader),
                        ReaderKind::Json => route.with_reader(JsonBodyReader),
                    };
                }
                route
            })
            .collect()
    }

    pub fn build_api(&self) -> Result<HttpApi<MemoryBackend>> {
        let backend = self.build_backend()?;
        Ok(self.routes().into_iter().fold(HttpApi::new(backend), HttpApi::route))
    }
}
