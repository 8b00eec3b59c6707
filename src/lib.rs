//! dockdb: disposable database containers for local development.
//!
//! Creates a Postgres, MySQL, MongoDB, Redis or SQL Server container with
//! a database and user ready to connect to. SQL Server needs the most
//! work: the image only knows the `SA` login, so after start-up the
//! [`provision::mssql`] module waits for the server and creates the
//! database, login and user itself.

pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod provision;
pub mod testing;
