//! Reconciler
//!
//! 가져온 레코드를 로컬 스키마에 반영합니다. 멱등·수렴적이며
//! 절대 파괴적이지 않습니다: 이미 알려진 사실은 no-op, 레코드에
//! 없는 속성이 기존 사실을 지우는 일도 없습니다.

use chrono::Utc;

use crate::config::FieldSpec;
use crate::db::PageWriter;
use crate::error::HarvestResult;
use crate::models::{ConceptRecord, ReconcileCounts};

/// 레코드 → 저장소 반영기
pub struct Reconciler {
    fields: Vec<FieldSpec>,
}

impl Reconciler {
    pub fn new(fields: &[FieldSpec]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    /// 페이지의 레코드 전체를 반영하고 카운트를 돌려줍니다.
    ///
    /// 커밋은 호출자 몫입니다 (페이지 단위 원자성).
    pub fn reconcile_page(
        &self,
        writer: &PageWriter<'_>,
        records: &[ConceptRecord],
    ) -> HarvestResult<ReconcileCounts> {
        let now = Utc::now().timestamp_millis();
        let mut counts = ReconcileCounts::default();
        for record in records {
            self.reconcile_record(writer, record, now, &mut counts)?;
        }
        Ok(counts)
    }

    fn reconcile_record(
        &self,
        writer: &PageWriter<'_>,
        record: &ConceptRecord,
        now: i64,
        counts: &mut ReconcileCounts,
    ) -> HarvestResult<()> {
        // 개념 URI가 없는 레코드는 통째로 스킵 (에러도, 카운트 대상도 아님)
        let uri = match record.concept_uri.as_deref() {
            Some(uri) if !uri.trim().is_empty() => uri,
            _ => return Ok(()),
        };

        let (term_id, created) = writer.insert_or_get_term(uri, now)?;
        if created {
            counts.terms_inserted += 1;
        } else {
            counts.terms_updated += 1;
        }

        // 매핑 테이블에 있는 속성만 반영. 값이 비어 있으면 무시.
        for field in &self.fields {
            let Some(value) = record.value(&field.var) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            if writer.insert_term_field(term_id, &field.uri, &field.label, value, now)? {
                counts.fields_inserted += 1;
            }
        }

        Ok(())
    }
}
