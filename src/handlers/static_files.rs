//! # Archivos Estáticos
//! src/handlers/static_files.rs
//!
//! Resuelve `raíz + path`, prueba `index.html` para directorios y transmite
//! el archivo sin cargarlo entero en memoria.

use crate::http::{Response, StatusCode};
use std::fs::{self, File};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};

/// Bit de lectura para el dueño del archivo
const OWNER_READ: u32 = 0o400;

/// Content-Type según la extensión
///
/// # Ejemplo
/// ```
/// use spade::handlers::static_files::content_type;
/// use std::path::Path;
///
/// assert_eq!(content_type(Path::new("a/index.html")), "text/html");
/// assert_eq!(content_type(Path::new("logo.gif")), "image/gif");
/// assert_eq!(content_type(Path::new("notes.md")), "text/plain");
/// ```
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html",
        Some("gif") => "image/gif",
        Some("jpg") => "image/jpeg",
        _ => "text/plain",
    }
}

/// Resultado de resolver un path contra la raíz estática
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Archivo regular legible y su tamaño
    Found(PathBuf, u64),
    /// Existe pero no se puede servir
    Forbidden,
    NotFound,
}

/// Resuelve un path del request a un archivo dentro de `root`
///
/// Un path con componentes `..` nunca sale de la raíz: se trata como
/// prohibido.
pub fn resolve(root: &Path, request_path: &str) -> Resolution {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Resolution::Forbidden;
    }

    let mut target = root.join(relative);
    let mut metadata = match fs::metadata(&target) {
        Ok(metadata) => metadata,
        Err(_) => return Resolution::NotFound,
    };

    if metadata.is_dir() {
        target.push("index.html");
        metadata = match fs::metadata(&target) {
            Ok(metadata) => metadata,
            Err(_) => return Resolution::NotFound,
        };
    }

    if !metadata.is_file() || metadata.permissions().mode() & OWNER_READ == 0 {
        return Resolution::Forbidden;
    }

    Resolution::Found(target, metadata.len())
}

/// Sirve un archivo estático sobre `stream`
///
/// Retorna el status que se envió.
pub fn serve<W: Write>(stream: &mut W, root: &Path, request_path: &str) -> io::Result<StatusCode> {
    let (path, size) = match resolve(root, request_path) {
        Resolution::Found(path, size) => (path, size),
        Resolution::Forbidden => return send_error(stream, StatusCode::Forbidden, request_path),
        Resolution::NotFound => return send_error(stream, StatusCode::NotFound, request_path),
    };

    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(_) => return send_error(stream, StatusCode::Forbidden, request_path),
    };

    let head = Response::new(StatusCode::Ok)
        .with_header("Content-Length", &size.to_string())
        .with_header("Content-Type", content_type(&path))
        .head_bytes();

    stream.write_all(&head)?;
    io::copy(&mut file, stream)?;
    stream.flush()?;

    Ok(StatusCode::Ok)
}

/// Escribe una respuesta de error completa
pub fn send_error<W: Write>(stream: &mut W, status: StatusCode, cause: &str) -> io::Result<StatusCode> {
    stream.write_all(&Response::error(status, cause).to_bytes())?;
    stream.flush()?;
    Ok(status)
}
