/*
 * Responsibility
 * - Public interface of the middleware layer
 * - auth: bearer verification + role gate; http: cross-cutting transport concerns
 */
pub mod auth;
pub mod http;
