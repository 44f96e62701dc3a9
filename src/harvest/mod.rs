//! Harvest Module
//!
//! 수집 파이프라인: 레코드 반영(reconciler)과 실행 오케스트레이션(pipeline)

pub mod pipeline;
pub mod reconciler;
