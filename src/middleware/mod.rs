/*
 * Responsibility
 * - middlware の公開インターフェース (re-export)
 * - http (request id / trace / limits / timeout), security_headers, auth (identity)
 */
pub mod auth;
pub mod http;
pub mod security_headers;
