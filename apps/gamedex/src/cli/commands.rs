//! # CLI Command Implementations

use crate::api::{self, StatusResponse};
use crate::config::ServerConfig;
use gamedex_core::{
    Catalog, CatalogError, CatalogSnapshot, CatalogStore, Developer, Game, Genre,
    snapshot_from_bytes, snapshot_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import (256 MB), matching the snapshot limit.
const MAX_IMPORT_FILE_SIZE: u64 = 256 * 1024 * 1024;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CatalogError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CatalogError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CatalogError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CatalogError> {
    let canonical = path.canonicalize().map_err(|e| {
        CatalogError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CatalogError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, CatalogError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CatalogError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CatalogError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CatalogError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: &str,
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), CatalogError> {
    let mut config = ServerConfig::load(config_path)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let catalog = load_catalog(db_path, backend)?;

    println!("gamedex Catalog Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Public URL: {}", config.base_url());
    println!("  Backend:    {}", backend);
    println!("  Database:   {:?}", db_path);
    println!();
    println!("Endpoints (also under /v1 and /v2):");
    println!("  GET    /games | /genres | /developers       - List");
    println!("  GET    /{{resource}}/search                   - Search");
    println!("  GET    /{{resource}}/{{id}}                     - Fetch");
    println!("  POST   /{{resource}}                          - Create");
    println!("  PUT    /{{resource}}/{{id}}                     - Replace");
    println!("  DELETE /{{resource}}/{{id}}                     - Delete");
    println!("  GET    /health                              - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, catalog).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Count the records of every kind.
pub fn catalog_status(catalog: &Catalog) -> Result<StatusResponse, CatalogError> {
    Ok(StatusResponse {
        games: catalog.count::<Game>()?,
        genres: catalog.count::<Genre>()?,
        developers: catalog.count::<Developer>()?,
        persistent: catalog.is_persistent(),
    })
}

/// Show record counts.
pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), CatalogError> {
    let catalog = load_catalog(db_path, backend)?;
    let status = catalog_status(&catalog)?;

    if json_mode {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("Catalog Status");
        println!("==============");
        println!("Database:   {:?}", db_path);
        println!("Backend:    {}", backend);
        println!("Games:      {}", status.games);
        println!("Genres:     {}", status.genres);
        println!("Developers: {}", status.developers);
    }

    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export the catalog as a binary snapshot or pretty JSON.
pub fn cmd_export(
    db_path: &Path,
    backend: &str,
    output: &Path,
    format: &str,
) -> Result<(), CatalogError> {
    let output = validate_output_path(output)?;
    let catalog = load_catalog(db_path, backend)?;
    let snapshot = catalog.snapshot()?;

    let data = match format {
        "json" => serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?,
        "snapshot" => snapshot_to_bytes(&snapshot)?,
        other => {
            return Err(CatalogError::Io(format!(
                "Unknown export format '{}' (expected snapshot or json)",
                other
            )));
        }
    };

    std::fs::write(&output, &data)
        .map_err(|e| CatalogError::Io(format!("Write {:?}: {}", output, e)))?;

    println!(
        "Exported {} records ({} bytes) to {:?}",
        snapshot.len(),
        data.len(),
        output
    );
    Ok(())
}

/// Import an export into an empty catalog. Records keep their identifiers.
pub fn cmd_import(db_path: &Path, backend: &str, input: &Path) -> Result<(), CatalogError> {
    let input = validate_file_path(input)?;
    validate_file_size(&input, MAX_IMPORT_FILE_SIZE)?;

    let data =
        std::fs::read(&input).map_err(|e| CatalogError::Io(format!("Read {:?}: {}", input, e)))?;
    let snapshot = parse_export(&data)?;
    let records = snapshot.len();

    let mut catalog = load_catalog(db_path, backend)?;
    catalog.restore(snapshot)?;
    save_catalog(&catalog, db_path)?;

    println!("Imported {} records from {:?}", records, input);
    Ok(())
}

/// Decode a binary snapshot, falling back to JSON.
fn parse_export(data: &[u8]) -> Result<CatalogSnapshot, CatalogError> {
    match snapshot_from_bytes(data) {
        Ok(snapshot) => Ok(snapshot),
        Err(binary_err) => serde_json::from_slice::<CatalogSnapshot>(data).map_err(|_| {
            CatalogError::Serialization(format!("Could not parse export file: {}", binary_err))
        }),
    }
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), CatalogError> {
    if db_path.exists() {
        if !force {
            return Err(CatalogError::Io(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| CatalogError::Io(format!("Remove {:?}: {}", db_path, e)))?;
    }

    let catalog = load_catalog(db_path, backend)?;
    save_catalog(&catalog, db_path)?;
    println!("Initialized new {} database at {:?}", backend, db_path);
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the catalog at `db_path` with the named backend.
///
/// - `redb`: opens (or creates) the database file
/// - `memory`: loads the snapshot file if it exists, else starts empty
pub fn load_catalog(db_path: &Path, backend: &str) -> Result<Catalog, CatalogError> {
    match backend {
        "redb" => Catalog::with_redb(db_path),
        "memory" => {
            let mut catalog = Catalog::new();
            if db_path.exists() {
                validate_file_size(db_path, MAX_IMPORT_FILE_SIZE)?;
                let data = std::fs::read(db_path)
                    .map_err(|e| CatalogError::Io(format!("Read db: {}", e)))?;
                catalog.restore(snapshot_from_bytes(&data)?)?;
            }
            Ok(catalog)
        }
        other => Err(CatalogError::Io(format!(
            "Unknown backend '{}' (expected memory or redb)",
            other
        ))),
    }
}

/// Write an in-memory catalog back to its snapshot file.
///
/// A redb catalog commits on every write and needs nothing here.
pub fn save_catalog(catalog: &Catalog, db_path: &Path) -> Result<(), CatalogError> {
    if catalog.is_persistent() {
        return Ok(());
    }
    let data = snapshot_to_bytes(&catalog.snapshot()?)?;
    std::fs::write(db_path, &data).map_err(|e| CatalogError::Io(format!("Write db: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gamedex_core::{GenreDraft, MemoryIdempotencyStore, Orchestrator};

    fn seeded(catalog: &mut Catalog) {
        let cache = MemoryIdempotencyStore::new();
        Orchestrator::new(catalog, &cache)
            .create::<Genre>(
                GenreDraft {
                    name: "Puzzle".to_string(),
                    description: None,
                },
                None,
                "/genres",
            )
            .expect("create");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_catalog(&dir.path().join("x.db"), "sqlite").expect_err("unknown");
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn memory_backend_round_trips_through_its_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("catalog.db");

        let mut catalog = load_catalog(&db, "memory").expect("load");
        seeded(&mut catalog);
        save_catalog(&catalog, &db).expect("save");

        let reloaded = load_catalog(&db, "memory").expect("reload");
        let status = catalog_status(&reloaded).expect("status");
        assert_eq!(status.genres, 1);
        assert!(!status.persistent);
    }

    #[test]
    fn export_then_import_into_redb() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("source.db");
        let target = dir.path().join("target.redb");
        let export = dir.path().join("catalog.json");

        let mut catalog = load_catalog(&source, "memory").expect("load");
        seeded(&mut catalog);
        save_catalog(&catalog, &source).expect("save");

        cmd_export(&source, "memory", &export, "json").expect("export");
        cmd_import(&target, "redb", &export).expect("import");

        let imported = load_catalog(&target, "redb").expect("open");
        assert_eq!(catalog_status(&imported).expect("status").genres, 1);
    }

    #[test]
    fn import_refuses_populated_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("source.db");
        let target = dir.path().join("target.redb");
        let export = dir.path().join("catalog.snapshot");

        let mut catalog = load_catalog(&source, "memory").expect("load");
        seeded(&mut catalog);
        save_catalog(&catalog, &source).expect("save");
        cmd_export(&source, "memory", &export, "snapshot").expect("export");

        {
            let mut existing = load_catalog(&target, "redb").expect("open");
            seeded(&mut existing);
        }

        let err = cmd_import(&target, "redb", &export).expect_err("populated");
        assert!(matches!(err, CatalogError::Conflict(_)));

        let kept = load_catalog(&target, "redb").expect("reopen");
        assert_eq!(catalog_status(&kept).expect("status").genres, 1);
    }

    #[test]
    fn init_refuses_existing_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("catalog.db");

        cmd_init(&db, "memory", false).expect("first init");
        assert!(cmd_init(&db, "memory", false).is_err());
        cmd_init(&db, "memory", true).expect("forced init");
    }

    #[test]
    fn export_rejects_unknown_format() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("catalog.db");
        let err = cmd_export(&db, "memory", &dir.path().join("out.bin"), "xml")
            .expect_err("format");
        assert!(err.to_string().contains("xml"));
    }
}
