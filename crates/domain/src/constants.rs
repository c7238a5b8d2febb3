//! Domain constants

/// Canonical column order of the flat export file. This is a bit-exact
/// contract consumed by downstream reconciliation tooling.
pub const EXPORT_HEADER: &str = "propertyId,address,parcelNumber,propertyType,status,acres,value";

/// Field delimiter of the export format. Fields must not contain it.
pub const EXPORT_DELIMITER: char = ',';

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Port probed for reachability before any transfer is attempted.
/// The probe is a plain TCP handshake against the secure-transport port,
/// independent of the FTP control port.
pub const DEFAULT_PROBE_PORT: u16 = 443;

/// File extensions considered property data when scanning a remote
/// directory.
pub const DATA_FILE_EXTENSIONS: [&str; 3] = ["csv", "json", "xml"];

/// Human-readable data source recorded in the sync manifest.
pub const MANIFEST_SOURCE: &str = "Benton County, Washington";

/// Name of the manifest sidecar written after a successful run.
pub const MANIFEST_FILENAME: &str = "metadata.json";
