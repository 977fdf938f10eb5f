//! # URIs
//! src/http/uri.rs
//!
//! Acepta tanto la forma absoluta (`http://host:port/path?query`) como la
//! forma de origen (`/path?query`).
//!
//! `is_dynamic` solo indica que el path traía `?`. Es una convención de
//! nombres: el dispatcher igual puede servir el path como archivo estático
//! si ningún handler coincide.

/// Puerto por defecto cuando el URI no trae uno
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// URI parseado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub query_string: String,
    pub valid: bool,
    pub is_dynamic: bool,
}

impl Uri {
    /// Parsea un URI de la request line
    ///
    /// # Ejemplo
    /// ```
    /// use spade::http::Uri;
    ///
    /// let uri = Uri::parse("http://localhost:8080/cgi/add?value=1&value=2");
    /// assert_eq!(uri.host, "localhost");
    /// assert_eq!(uri.port, 8080);
    /// assert_eq!(uri.path, "/cgi/add");
    /// assert_eq!(uri.query_string, "value=1&value=2");
    /// assert!(uri.is_dynamic);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut uri = Uri {
            host: String::new(),
            port: DEFAULT_HTTP_PORT,
            path: String::new(),
            query_string: String::new(),
            valid: false,
            is_dynamic: false,
        };

        if raw.is_empty() {
            return uri;
        }

        // Quitar el esquema (`proto://`) si viene
        let rest = match raw.find("://") {
            Some(index) => &raw[index + 3..],
            None => raw,
        };

        let (authority, path) = match rest.find(|c: char| c == '/' || c == '?') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };

        if !authority.is_empty() {
            match authority.split_once(':') {
                Some((host, port)) => {
                    uri.host = host.to_string();
                    match port.parse() {
                        Ok(port) => uri.port = port,
                        Err(_) => return uri,
                    }
                }
                None => uri.host = authority.to_string(),
            }
        }

        let path = match path.split_once('?') {
            Some((path, query)) => {
                uri.is_dynamic = true;
                uri.query_string = query.to_string();
                path
            }
            None => path,
        };

        uri.path = if path.is_empty() { "/".to_string() } else { path.to_string() };
        uri.valid = true;
        uri
    }

    /// Reconstruye el path con su query string
    pub fn path_and_query(&self) -> String {
        if self.is_dynamic {
            format!("{}?{}", self.path, self.query_string)
        } else {
            self.path.clone()
        }
    }
}
