//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.0 y convertirlas a bytes.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Server: Spade/0.1.0\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <html>...</html>
//! ```
//!
//! Los handlers dinámicos (CGI, módulos, workers) reciben el socket con la
//! cabecera *abierta*: status line y `Server` ya escritos, sin la línea
//! vacía. El handler escribe el resto de headers, la línea vacía y el body.
//! Ver [`Response::open_head_bytes`].
//!
//! ## Ejemplo de uso
//!
//! ```
//! use spade::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("Hello");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::header::Header;
use super::request::Version;
use super::StatusCode;

/// Valor del header `Server` y de `SERVER_SOFTWARE`
pub const SERVER_SOFTWARE: &str = concat!("Spade/", env!("CARGO_PKG_VERSION"));

/// Representa una respuesta HTTP/1.0
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de escritura
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (vacío cuando el body se transmite aparte)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta con el header `Server` ya puesto
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![("Server".to_string(), SERVER_SOFTWARE.to_string())],
            body: Vec::new(),
        }
    }

    /// Agrega un header; si ya existe, se sobrescribe
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`with_header`](Self::with_header)
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body desde un string y calcula `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el body desde bytes y calcula `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    /// Respuesta de error con un body HTML
    ///
    /// # Ejemplo
    /// ```
    /// use spade::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "/missing");
    /// let text = String::from_utf8(response.to_bytes()).unwrap();
    /// assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
    /// assert!(text.contains("/missing"));
    /// ```
    pub fn error(status: StatusCode, cause: &str) -> Self {
        let body = format!(
            "<html><title>Spade Error</title><body bgcolor=\"ffffff\">\r\n\
             {}: {}\r\n\
             <p>{}: {}\r\n\
             <hr><em>{}</em>\r\n\
             </body></html>\r\n",
            status.as_u16(),
            status.reason_phrase(),
            status.description(),
            escape_html(cause),
            SERVER_SOFTWARE,
        );
        Self::new(status)
            .with_header("Content-Type", "text/html")
            .with_body(&body)
    }

    /// Status line y headers, sin la línea vacía final
    ///
    /// Es lo que se escribe antes de ceder el socket a un handler dinámico.
    pub fn open_head_bytes(&self) -> Vec<u8> {
        let mut result = format!("{} {}\r\n", Version::HTTP_1_0.as_str(), self.status);
        for (name, value) in &self.headers {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result.into_bytes()
    }

    /// Cabecera completa (con la línea vacía) sin el body
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = self.open_head_bytes();
        result.extend_from_slice(b"\r\n");
        result
    }

    /// Convierte la respuesta completa a bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Valor de un header por nombre
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Escapa texto para insertarlo en un body HTML
///
/// # Ejemplo
/// ```
/// use spade::http::response::escape_html;
///
/// assert_eq!(escape_html("<a href='x'>"), "&lt;a href=&#39;x&#39;&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Cabecera de una respuesta leída desde el cable
///
/// La usan los clientes (pruebas, workers) para interpretar lo que el
/// servidor envió.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: Version,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<Header>,
    pub valid: bool,
}

impl ResponseHead {
    /// Parsea una status line: `VERSION SP STATUS SP REASON`
    ///
    /// Es inválida si la versión es desconocida o el status está fuera
    /// de 100..=510.
    pub fn parse_status_line(line: &str) -> Self {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let mut parts = line.splitn(3, ' ');

        let version = parts.next().map(Version::parse).unwrap_or(Version::NONE);
        let status = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let reason = parts.next().unwrap_or("").to_string();

        let valid = version != Version::NONE && (100..=510).contains(&status);

        Self {
            version,
            status,
            reason,
            headers: Vec::new(),
            valid,
        }
    }

    /// Parsea la cabecera completa de una respuesta
    ///
    /// Retorna la cabecera y el offset donde empieza el body. Las líneas de
    /// header malformadas se descartan.
    ///
    /// # Ejemplo
    /// ```
    /// use spade::http::ResponseHead;
    ///
    /// let raw = b"HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nhi";
    /// let (head, offset) = ResponseHead::parse(raw);
    /// assert!(head.valid);
    /// assert_eq!(head.status, 200);
    /// assert_eq!(&raw[offset..], b"hi");
    /// ```
    pub fn parse(raw: &[u8]) -> (Self, usize) {
        let mut lines = LineIter { raw, offset: 0 };

        let mut head = match lines.next() {
            Some(line) => Self::parse_status_line(&line),
            None => Self::parse_status_line(""),
        };

        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            let header = Header::parse(&line);
            if header.valid {
                head.headers.push(header);
            }
        }

        (head, lines.offset)
    }

    /// Primer header con esa key
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }

    /// Serializa la cabecera (omite `Keep-Alive`)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = format!("{} {} {}\r\n", self.version.as_str(), self.status, self.reason);
        for header in &self.headers {
            if header.key != "Keep-Alive" {
                result.push_str(&header.to_line());
            }
        }
        result.push_str("\r\n");
        result.into_bytes()
    }
}

/// Itera líneas `\r\n` (o `\n`) de un buffer recordando el offset consumido
struct LineIter<'a> {
    raw: &'a [u8],
    offset: usize,
}

impl Iterator for LineIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.offset >= self.raw.len() {
            return None;
        }
        let rest = &self.raw[self.offset..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.offset += consumed;

        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(String::from_utf8_lossy(line).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response_has_server_header() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.header("Server"), Some(SERVER_SOFTWARE));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_with_header_overwrites() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_header("Content-Type", "text/html");

        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.headers().len(), 2);
    }

    #[test]
    fn test_with_body_sets_length() {
        let response = Response::new(StatusCode::Ok).with_body("Hello World");
        assert_eq!(response.header("Content-Length"), Some("11"));
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_body("Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\nServer: Spade/"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_open_head_has_no_blank_line() {
        let text = String::from_utf8(Response::new(StatusCode::Ok).open_head_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(!text.contains("\r\n\r\n"));
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(StatusCode::Forbidden, "/secret.txt");
        assert_eq!(response.status(), StatusCode::Forbidden);
        assert_eq!(response.header("Content-Type"), Some("text/html"));

        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("403: Forbidden"));
        assert!(body.contains("/secret.txt"));
    }

    #[test]
    fn test_error_body_escapes_cause() {
        let response = Response::error(StatusCode::NotFound, "/<script>alert(\"x\" & 'y')</script>");
        let body = String::from_utf8(response.body().to_vec()).unwrap();

        assert!(!body.contains("<script>"));
        assert!(body.contains("/&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_parse_status_line() {
        let head = ResponseHead::parse_status_line("HTTP/1.1 404 Not Found\r\n");
        assert!(head.valid);
        assert_eq!(head.version, Version::HTTP_1_1);
        assert_eq!(head.status, 404);
        assert_eq!(head.reason, "Not Found");
    }

    #[test]
    fn test_parse_status_line_out_of_range() {
        assert!(!ResponseHead::parse_status_line("HTTP/1.0 99 Odd").valid);
        assert!(!ResponseHead::parse_status_line("HTTP/1.0 600 Odd").valid);
        assert!(!ResponseHead::parse_status_line("SPDY/3 200 OK").valid);
    }

    #[test]
    fn test_parse_full_head() {
        let raw = b"HTTP/1.0 200 OK\r\nServer: x\r\nbroken\r\nContent-Type: text/html\r\n\r\n5\r\n";
        let (head, offset) = ResponseHead::parse(raw);

        assert_eq!(head.headers.len(), 2);
        assert_eq!(head.header("Content-Type"), Some("text/html"));
        assert_eq!(&raw[offset..], b"5\r\n");
    }

    #[test]
    fn test_head_serialization_drops_keep_alive() {
        let raw = b"HTTP/1.1 200 OK\r\nKeep-Alive: 5\r\nServer: x\r\n\r\n";
        let (head, _) = ResponseHead::parse(raw);
        let text = String::from_utf8(head.to_bytes()).unwrap();

        assert_eq!(text, "HTTP/1.1 200 OK\r\nServer: x\r\n\r\n");
    }

    #[test]
    fn test_response_round_trips_through_head_parser() {
        let bytes = Response::error(StatusCode::NotImplemented, "POST").to_bytes();
        let (head, offset) = ResponseHead::parse(&bytes);

        assert_eq!(head.status, 501);
        let length: usize = head.header("Content-Length").unwrap().parse().unwrap();
        assert_eq!(bytes.len() - offset, length);
    }
}
