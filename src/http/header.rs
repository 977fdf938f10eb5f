//! # Headers HTTP
//! src/http/header.rs
//!
//! Un header es una línea `Key: Value`. La key es case-sensitive y se
//! guardan en orden de llegada (se permiten keys duplicadas).

/// Largo máximo de la key de un header
pub const MAX_HEADER_KEY_LENGTH: usize = 256;

/// Largo máximo del valor; valores más largos se truncan
pub const MAX_HEADER_VALUE_LENGTH: usize = 1024;

/// Cantidad máxima de headers que se guardan por mensaje
pub const MAX_HEADERS: usize = 64;

/// Header HTTP parseado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
    /// `false` si la línea no se pudo separar en `key: value`
    pub valid: bool,
}

impl Header {
    /// Crea un header válido
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            valid: true,
        }
    }

    /// Parsea una línea de header
    ///
    /// Separa en el primer `:` y descarta los espacios que siguen.
    /// Una línea sin `:`, con key vacía o con key más larga que
    /// [`MAX_HEADER_KEY_LENGTH`] produce un header inválido.
    ///
    /// # Ejemplo
    /// ```
    /// use spade::http::Header;
    ///
    /// let header = Header::parse("Host: localhost:8080\r\n");
    /// assert!(header.valid);
    /// assert_eq!(header.key, "Host");
    /// assert_eq!(header.value, "localhost:8080");
    /// ```
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(&['\r', '\n'][..]);

        let Some(colon) = line.find(':') else {
            return Self::invalid();
        };

        let key = &line[..colon];
        if key.is_empty() || key.len() > MAX_HEADER_KEY_LENGTH {
            return Self::invalid();
        }

        let value = line[colon + 1..].trim_start();

        Self {
            key: key.to_string(),
            value: truncate(value, MAX_HEADER_VALUE_LENGTH).to_string(),
            valid: true,
        }
    }

    fn invalid() -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            valid: false,
        }
    }

    /// Serializa el header como `Key: Value\r\n`
    pub fn to_line(&self) -> String {
        format!("{}: {}\r\n", self.key, self.value)
    }
}

/// Corta `s` a lo sumo en `max` bytes sin partir un carácter UTF-8
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let header = Header::parse("Accept: text/html\r\n");
        assert!(header.valid);
        assert_eq!(header.key, "Accept");
        assert_eq!(header.value, "text/html");
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let header = Header::parse("Host: example.com:8080");
        assert_eq!(header.value, "example.com:8080");
    }

    #[test]
    fn test_no_colon_is_invalid() {
        assert!(!Header::parse("garbage line\r\n").valid);
    }

    #[test]
    fn test_empty_key_is_invalid() {
        assert!(!Header::parse(": value").valid);
    }

    #[test]
    fn test_oversized_key_is_invalid() {
        let line = format!("{}: v", "k".repeat(MAX_HEADER_KEY_LENGTH + 1));
        assert!(!Header::parse(&line).valid);
    }

    #[test]
    fn test_oversized_value_is_truncated() {
        let line = format!("X-Long: {}", "v".repeat(MAX_HEADER_VALUE_LENGTH + 50));
        let header = Header::parse(&line);
        assert!(header.valid);
        assert_eq!(header.value.len(), MAX_HEADER_VALUE_LENGTH);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("ñañ", 3), "ña");
    }

    #[test]
    fn test_to_line() {
        assert_eq!(Header::new("Server", "Spade").to_line(), "Server: Spade\r\n");
    }
}
