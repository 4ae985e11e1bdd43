//! Spline evaluation: Bezier, NURBS, and poly splines.
//!
//! A spline stores sparse control points and lazily produces dense evaluated
//! points plus derived tangents, normals, and accumulated lengths. Every piece
//! of evaluated data sits in its own [`EvalCache`], so readers on several
//! threads can share a spline while each cache is computed at most once.

pub mod bezier;
pub mod cache;
pub mod curve_eval;
pub mod nurbs;
pub mod poly;
pub mod spline;

pub use bezier::{BezierSpline, HandlePositions, HandleType, InsertResult, InterpolationData};
pub use cache::EvalCache;
pub use curve_eval::CurveEval;
pub use nurbs::{BasisCache, KnotsMode, NurbsSpline};
pub use poly::PolySpline;
pub use spline::{
    LookupResult, NormalCalculationMode, Spline, SplineCommon, SplineExt, SplinePtr, SplineType,
};
