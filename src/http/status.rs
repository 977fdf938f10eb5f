//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos de estado HTTP/1.0 que produce el servidor. Spade solo genera
//! cuatro: 200, 403, 404 y 501. El resto de códigos que aparecen en una
//! status line (por ejemplo al parsear respuestas) se manejan como `u16`
//! en [`ResponseHead`](super::ResponseHead).

/// Códigos de estado que el servidor puede emitir
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 403 Forbidden - El recurso existe pero no se puede leer o ejecutar
    Forbidden = 403,

    /// 404 Not Found - Ni handler ni archivo para el path
    NotFound = 404,

    /// 501 Not Implemented - Método distinto de GET
    NotImplemented = 501,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use spade::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Obtiene el código a partir de su valor numérico, si el servidor lo conoce
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            403 => Some(StatusCode::Forbidden),
            404 => Some(StatusCode::NotFound),
            501 => Some(StatusCode::NotImplemented),
            _ => None,
        }
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use spade::http::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// Mensaje largo para el body HTML de las respuestas de error
    pub fn description(&self) -> &'static str {
        match self {
            StatusCode::Ok => "Request served",
            StatusCode::Forbidden => "The server is not allowed to serve this resource",
            StatusCode::NotFound => "The server could not find this resource",
            StatusCode::NotImplemented => "The server does not implement this method",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
