//! Read, write, and process [ASPRS
//! LAS](https://www.asprs.org/committee-general/laser-las-file-format-exchange-activities.html)
//! point cloud data.
//!
//! # Reading
//!
//! Read a las (or laz) file with [Las::read_from]:
//!
//! ```no_run
//! use pointclouds::las::ReadOptions;
//! use pointclouds::Las;
//! let las = Las::read_from("points.las", ReadOptions::default()).unwrap();
//! for point in las.iter() {
//!     let point = point.unwrap();
//!     println!("({}, {}, {})", point.x, point.y, point.z);
//! }
//! ```
//!
//! The [ReadOptions](las::ReadOptions) choose how the points are held: read
//! eagerly into memory, memory-mapped, streamed through a cursor, or skipped
//! entirely. Everything downstream works against the [PointView](view::PointView)
//! trait, so a container backed by a 100 GB memory-mapped file behaves like
//! an owned vector, just lazier:
//!
//! ```no_run
//! use pointclouds::las::{PointReadMode, ReadOptions};
//! use pointclouds::Las;
//! let options = ReadOptions { mode: PointReadMode::Lazy, ..Default::default() };
//! let las = Las::read_from("huge.las", options).unwrap();
//! let ground = las.filter(|point| point.classification == pointclouds::point::Classification::Ground);
//! ```
//!
//! # Writing
//!
//! Build a container in memory and write it out:
//!
//! ```
//! use std::io::Cursor;
//! use pointclouds::las::WriteOptions;
//! use pointclouds::{Header, Las, Point};
//!
//! let las = Las::new(
//!     Header::default(),
//!     vec![Point { x: 1., y: 2., z: 3., ..Default::default() }],
//! )
//! .unwrap();
//! las.write_to(Cursor::new(Vec::new()), WriteOptions::default()).unwrap();
//! ```
//!
//! The writer trusts the data over the stored summary: point counts, per
//! return counts, and bounds are recomputed from the points before the
//! header hits the sink.
//!
//! # Processing
//!
//! A [PointCloud](cloud::PointCloud) is a columnar, schema-flexible view of
//! the same data, built for bulk work: parallel per-point maps, k nearest
//! neighbors, and rasterization.
//!
//! ```
//! use pointclouds::cloud::{knn, CloudBuilder};
//! use pointclouds::point::Attribute;
//! use pointclouds::{Header, Las, Point};
//!
//! let las = Las::new(
//!     Header::default(),
//!     (0..10)
//!         .map(|i| Point { x: i as f64, y: i as f64, z: 0., ..Default::default() })
//!         .collect(),
//! )
//! .unwrap();
//! let mut cloud = CloudBuilder::new()
//!     .attribute("intensity", Attribute::Intensity)
//!     .build(&las)
//!     .unwrap();
//! knn::neighbors_into(&mut cloud, 3).unwrap();
//! ```
//!
//! # Compression
//!
//! laszip-compressed data is supported through the `laz` cargo feature:
//!
//! ```toml
//! [dependencies]
//! pointclouds = { version = "*", features = ["laz"] }
//! ```
//!
//! The core itself never compresses or decompresses; see the [laz] module
//! for the capability hooks.

#![deny(
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_abi,
    missing_debug_implementations,
    missing_docs,
    non_ascii_idents,
    noop_method_call,
    rust_2021_incompatible_closure_captures,
    rust_2021_incompatible_or_patterns,
    rust_2021_prefixes_incompatible_syntax,
    rust_2021_prelude_collisions,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_op_in_unsafe_fn,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cloud;
pub mod feature;
pub mod filter;
pub mod geokey;
pub mod header;
pub mod las;
pub mod laz;
pub mod point;
pub mod raw;
pub mod view;
pub mod vlr;

mod bounds;
mod color;
mod crs;
mod error;
mod global_encoding;
mod transform;
mod utils;
mod vector;
mod version;

pub use crate::bounds::Bounds;
pub use crate::color::Color;
pub use crate::crs::{CoordinateTransform, Crs, IdentityTransform};
pub use crate::error::Error;
pub use crate::global_encoding::{GlobalEncoding, GpsTime};
pub use crate::header::{Builder, Header};
pub use crate::las::Las;
pub use crate::point::Point;
pub use crate::transform::Transform;
pub use crate::vector::{Axis, Vector};
pub use crate::version::Version;
pub use crate::vlr::Vlr;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
