//! Schema-driven bridge between application values and columnar rows.
//!
//! rowbridge builds two trees from a schema, once per scan:
//!
//! - a converter tree ([`convert`]) translating every column between the
//!   native domain application code works with and the stored domain a
//!   columnar file holds, including nested structs, lists, maps and unions;
//! - an evaluator tree ([`sarg`]) judging each raw row against a pushed-down
//!   search argument with three-valued logic.
//!
//! [`marshal::Row`] ties the converters to name-based field access, and
//! [`scan::RecordReader`] runs the fetch/filter loop over any
//! [`storage::RowSource`], such as a parquet file.
//!
//! ```no_run
//! use rowbridge::{
//!     config::Source,
//!     sarg::SearchArgument,
//!     storage::parquet::ParquetRowSource,
//! };
//!
//! # fn main() -> Result<(), rowbridge::Error> {
//! let argument = SearchArgument::builder().equals("id", 1i64).build()?;
//! let scan = Source::builder()
//!     .schema_from_source()
//!     .search_argument(&argument)
//!     .build()?;
//! let mut reader = scan.open(ParquetRowSource::open("rows.parquet")?)?;
//! let mut row = reader.create_row();
//! while reader.next(&mut row)? {
//!     println!("{}", row.get("name")?);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod observability;

pub mod config;
pub mod convert;
pub mod marshal;
pub mod sarg;
pub mod scan;
pub mod storage;
pub mod types;
pub mod value;

pub use error::Error;
