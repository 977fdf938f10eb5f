//! # Handlers CGI
//! src/handlers/cgi.rs
//!
//! Ejecuta un programa externo con el stdout conectado directo al socket
//! del cliente. El servidor sólo escribe la status line y el header
//! `Server`; el programa escribe el resto de la respuesta.

use super::static_files::send_error;
use super::variables::Variables;
use crate::http::{Response, StatusCode};
use log::{debug, warn};
use std::fs;
use std::io::{self, Write};
use std::net::TcpStream;
use std::os::fd::OwnedFd;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

/// Bit de ejecución para el dueño del archivo
const OWNER_EXEC: u32 = 0o100;

/// Estado de un ejecutable CGI en disco
#[derive(Debug, PartialEq, Eq)]
pub enum Executable {
    Ready,
    Missing,
    /// Existe pero no es un archivo regular con permiso de ejecución
    NotRunnable,
}

/// Revisa que `path` sea un archivo regular ejecutable
pub fn check_executable(path: &Path) -> Executable {
    match fs::metadata(path) {
        Err(_) => Executable::Missing,
        Ok(meta) if meta.is_file() && meta.permissions().mode() & OWNER_EXEC != 0 => {
            Executable::Ready
        }
        Ok(_) => Executable::NotRunnable,
    }
}

/// Ejecuta el programa CGI para un request
///
/// Retorna el status de la status line enviada. Si el programa termina con
/// error la respuesta ya está en camino, sólo se loguea.
pub fn serve(stream: &mut TcpStream, executable: &Path, variables: &Variables) -> io::Result<StatusCode> {
    match check_executable(executable) {
        Executable::Ready => {}
        Executable::Missing => return send_error(stream, StatusCode::NotFound, &variables.script_name),
        Executable::NotRunnable => {
            return send_error(stream, StatusCode::Forbidden, &variables.script_name)
        }
    }

    stream.write_all(&Response::new(StatusCode::Ok).open_head_bytes())?;
    stream.flush()?;

    let output = OwnedFd::from(stream.try_clone()?);
    let mut child = Command::new(executable)
        .envs(variables.to_env())
        .stdin(Stdio::null())
        .stdout(Stdio::from(output))
        .spawn()?;

    debug!("CGI {} started with pid {}", executable.display(), child.id());

    let status = child.wait()?;
    if !status.success() {
        warn!("CGI {} exited with {}", executable.display(), status);
    }

    Ok(StatusCode::Ok)
}
