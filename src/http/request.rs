//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser tolerante: un método o una versión desconocidos no son un error,
//! se guardan como el centinela `NONE` y marcan el request como inválido.
//! Así el servidor puede distinguir "método no soportado" (501) de una
//! request line que no se pudo entender (se cierra sin respuesta).
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /path?query HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! El body nunca se lee: solo se sirve GET.

use super::header::{Header, MAX_HEADERS};
use super::uri::Uri;
use log::{debug, warn};
use std::io::{self, BufRead, Cursor, Read};

/// Largo máximo de una línea (request line o header)
pub const MAX_LINE_LENGTH: usize = 8192;

/// Headers que solo se comparan al buscar una respuesta equivalente
const CACHE_KEY_HEADERS: [&str; 3] = ["Accept", "Accept-Language", "Accept-Encoding"];

/// Métodos HTTP reconocidos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    OPTIONS,
    POST,
    PUT,
    DELETE,
    /// Método desconocido
    NONE,
}

impl Method {
    /// Parsea un método; nunca falla, lo desconocido es `NONE`
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            _ => Method::NONE,
        }
    }

    /// Convierte el método a string (`""` para `NONE`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::NONE => "",
        }
    }
}

/// Versiones del protocolo reconocidas
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    HTTP_1_0,
    HTTP_1_1,
    /// Versión desconocida
    NONE,
}

impl Version {
    /// Parsea una versión; nunca falla, lo desconocido es `NONE`
    pub fn parse(s: &str) -> Self {
        match s {
            "HTTP/1.0" => Version::HTTP_1_0,
            "HTTP/1.1" => Version::HTTP_1_1,
            _ => Version::NONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::HTTP_1_0 => "HTTP/1.0",
            Version::HTTP_1_1 => "HTTP/1.1",
            Version::NONE => "HTTP/NONE",
        }
    }
}

/// Lee una línea terminada en `\n` de a lo sumo [`MAX_LINE_LENGTH`] bytes
///
/// Retorna `None` cuando el stream se agotó.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }
    if read == MAX_LINE_LENGTH && !buf.ends_with(b"\n") {
        warn!("Line longer than {} bytes, truncated", MAX_LINE_LENGTH);
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Representa un request HTTP parseado
///
/// Los componentes inválidos se guardan igual; `is_valid()` es verdadero
/// solo si método, versión y URI son válidos.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: Vec<Header>,
    has_host_header: bool,
    valid: bool,
    /// Dirección IP del cliente (la llena el connection handler)
    remote_address: String,
    /// Hostname del cliente si hubo reverse lookup
    remote_host: String,
}

impl Request {
    /// Parsea la request line: `METHOD SP URI SP VERSION`
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use spade::http::{Method, Request, Version};
    ///
    /// let request = Request::parse_request_line("GET /index.html HTTP/1.0\r\n");
    /// assert!(request.is_valid());
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.version(), Version::HTTP_1_0);
    ///
    /// let request = Request::parse_request_line("BREW /pot HTTP/1.0\r\n");
    /// assert!(!request.is_valid());
    /// assert_eq!(request.method(), Method::NONE);
    /// ```
    pub fn parse_request_line(line: &str) -> Self {
        let mut parts = line.split_whitespace();

        let method = parts.next().map(Method::parse).unwrap_or(Method::NONE);
        let uri = Uri::parse(parts.next().unwrap_or(""));
        let version = parts.next().map(Version::parse).unwrap_or(Version::NONE);

        let valid = method != Method::NONE && version != Version::NONE && uri.valid;

        Request {
            method,
            uri,
            version,
            headers: Vec::new(),
            has_host_header: false,
            valid,
            remote_address: String::new(),
            remote_host: String::new(),
        }
    }

    /// Lee headers hasta una línea vacía o hasta que se agote el stream
    ///
    /// Las líneas malformadas se descartan y la lectura sigue con la
    /// siguiente. Pasado [`MAX_HEADERS`] los headers se leen pero no se
    /// guardan.
    pub fn read_headers<R: BufRead>(&mut self, reader: &mut R) -> io::Result<()> {
        while let Some(line) = read_line(reader)? {
            if line.trim_end_matches(&['\r', '\n'][..]).is_empty() {
                break;
            }

            let header = Header::parse(&line);
            if !header.valid {
                debug!("Skipping malformed header {:?}", line.trim_end());
                continue;
            }
            self.push_header(header);
        }
        Ok(())
    }

    /// Agrega un header respetando el límite de [`MAX_HEADERS`]
    pub fn push_header(&mut self, header: Header) {
        if self.headers.len() >= MAX_HEADERS {
            debug!("Header limit of {} reached, dropping {}", MAX_HEADERS, header.key);
            return;
        }
        if header.key == "Host" {
            self.has_host_header = true;
        }
        self.headers.push(header);
    }

    /// Lee un request completo (request line + headers) desde un stream
    ///
    /// Retorna `Ok(None)` si el cliente cerró sin enviar nada.
    pub fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Option<Self>> {
        let Some(line) = read_line(reader)? else {
            return Ok(None);
        };

        let mut request = Self::parse_request_line(&line);
        request.read_headers(reader)?;
        Ok(Some(request))
    }

    /// Parsea un request desde bytes en memoria
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use spade::http::Request;
    ///
    /// let request = Request::parse(b"GET /cgi/add?value=1&value=2 HTTP/1.0\r\nHost: x\r\n\r\n");
    /// assert_eq!(request.path(), "/cgi/add");
    /// assert_eq!(request.query_string(), "value=1&value=2");
    /// assert_eq!(request.header("Host"), Some("x"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Self {
        let mut cursor = Cursor::new(buffer);
        match Self::read_from(&mut cursor) {
            Ok(Some(request)) => request,
            _ => Self::parse_request_line(""),
        }
    }

    /// Serializa el request al formato de cable
    ///
    /// Siempre usa `HTTP/1.0` como versión y omite `Keep-Alive`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = format!(
            "{} {} {}\r\n",
            self.method.as_str(),
            self.uri.path_and_query(),
            Version::HTTP_1_0.as_str()
        );
        for header in &self.headers {
            if header.key != "Keep-Alive" {
                result.push_str(&header.to_line());
            }
        }
        result.push_str("\r\n");
        result.into_bytes()
    }

    /// Igualdad estructural: método, URI, versión y headers
    ///
    /// Ambos requests deben traer header `Host`.
    pub fn structurally_equal(&self, other: &Request) -> bool {
        self.method == other.method
            && uri_equal(&self.uri, &other.uri)
            && self.has_host_header
            && other.has_host_header
            && self.version == other.version
            && self.headers.len() == other.headers.len()
            && headers_agree(&self.headers, &other.headers)
            && headers_agree(&other.headers, &self.headers)
            && self.valid == other.valid
    }

    /// Igualdad relajada para buscar una respuesta equivalente
    ///
    /// Compara método y URI, y de los headers solo los `Accept*`.
    pub fn cache_equivalent(&self, other: &Request) -> bool {
        self.method == other.method
            && uri_equal(&self.uri, &other.uri)
            && self
                .headers
                .iter()
                .filter(|h| CACHE_KEY_HEADERS.contains(&h.key.as_str()))
                .all(|h| match other.header(&h.key) {
                    Some(value) => value == h.value,
                    None => true,
                })
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path del request sin query string
    pub fn path(&self) -> &str {
        &self.uri.path
    }

    pub fn query_string(&self) -> &str {
        &self.uri.query_string
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Primer header con esa key (case-sensitive)
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }

    pub fn has_host_header(&self) -> bool {
        self.has_host_header
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    pub fn set_remote_address(&mut self, address: &str) {
        self.remote_address = address.to_string();
    }

    pub fn set_remote_host(&mut self, host: &str) {
        self.remote_host = host.to_string();
    }
}

fn uri_equal(first: &Uri, second: &Uri) -> bool {
    first.host == second.host
        && first.port == second.port
        && first.path == second.path
        && first.valid == second.valid
}

/// Todo header de `first` cuya key aparece en `second` tiene el mismo valor
fn headers_agree(first: &[Header], second: &[Header]) -> bool {
    first.iter().all(|a| {
        second
            .iter()
            .filter(|b| b.key == a.key)
            .all(|b| b.value == a.value)
    })
}
