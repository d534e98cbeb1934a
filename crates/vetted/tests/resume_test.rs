//! Integration tests for checkpointing and resuming from files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vetted::persistence::checkpoint_path;
use vetted::{
    Decision, FilePersistence, MockGenerator, PersistenceLayer, PipelineConfig, Progress,
    RecordReader, ReviewPipeline, ReviewStatus, VettedError,
};

const HEADER: &str = "hotel_id,hotel_name,city,country,lat,lon,star_rating,\
cleanliness_base,comfort_base,facilities_base,location_base,staff_base,value_for_money_base";

/// Write a hotel CSV into `dir` and return its path.
fn write_hotels(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("hotels.csv");
    let mut contents = String::from(HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    fs::write(&path, contents).unwrap();
    path
}

fn sample_rows() -> Vec<&'static str> {
    vec![
        "a1,Hotel Lumen,Lisbon,Portugal,38.7,-9.1,4,8.7,8.2,7.9,9.3,9.1,8.1",
        "a2,Casa Azul,Porto,Portugal,,,3,8.1,7.7,7.0,8.8,8.9,8.4",
        "a3,Hotel Miradouro,Lisbon,Portugal,,,5,9.4,9.0,8.8,9.1,9.5,7.9",
        "a4,Pensao Central,Coimbra,Portugal,,,2,7.2,6.9,6.1,8.5,8.0,8.7",
    ]
}

/// A fresh pipeline over the file, restored from its checkpoint if one exists.
fn open(data: &Path, generator: MockGenerator) -> ReviewPipeline {
    let batch = RecordReader::new().read_file(data).unwrap();
    let config = PipelineConfig::default().with_learning_interval(2);
    let mut pipeline =
        ReviewPipeline::new(generator, FilePersistence::for_data_file(data)).with_config(config);

    if !pipeline.restore(batch.source.as_ref()).unwrap() {
        pipeline.ingest(batch).unwrap();
    }
    pipeline
}

fn awaiting(pipeline: &mut ReviewPipeline) -> usize {
    match pipeline.advance().unwrap() {
        Progress::AwaitingHuman(index) => index,
        Progress::Complete(_) => panic!("batch finished early"),
    }
}

// =============================================================================
// Resume
// =============================================================================

#[test]
fn test_resume_after_restart() {
    let dir = TempDir::new().unwrap();
    let data = write_hotels(dir.path(), &sample_rows());

    let (draft, learned) = {
        let mut pipeline = open(&data, MockGenerator::new());
        assert_eq!(awaiting(&mut pipeline), 0);
        pipeline.resume(Decision::Accept).unwrap();
        assert_eq!(awaiting(&mut pipeline), 1);
        pipeline.resume(Decision::edit("Casa Azul is a quiet 3-star stay.")).unwrap();

        assert_eq!(awaiting(&mut pipeline), 2);
        let draft = pipeline.current().unwrap().draft_summary.clone().unwrap();
        (draft, pipeline.learning().state().clone())
    };
    assert_eq!(learned.built_from, 2);

    // A new process with a generator that has never been called.
    let generator = MockGenerator::new();
    let mut pipeline = open(&data, generator.clone());

    assert_eq!(pipeline.completed_reviews(), 2);
    assert_eq!(pipeline.items()[0].status, ReviewStatus::Stored);
    assert_eq!(pipeline.items()[1].status, ReviewStatus::Stored);
    assert_eq!(pipeline.learning().state(), &learned);
    assert_eq!(pipeline.learning().history().len(), 2);
    assert_eq!(pipeline.learning().rebuilds(), 1);
    assert_eq!(pipeline.learning().status().rebuilds, 1);

    assert_eq!(awaiting(&mut pipeline), 2);
    assert_eq!(generator.call_count(), 0);
    assert_eq!(pipeline.current().unwrap().draft_summary.as_deref(), Some(draft.as_str()));

    pipeline.resume(Decision::reject("Too generic")).unwrap();
    assert_eq!(awaiting(&mut pipeline), 3);
    assert_eq!(generator.calls_for("a4").len(), 1);
    pipeline.resume(Decision::Accept).unwrap();

    match pipeline.advance().unwrap() {
        Progress::Complete(stats) => {
            assert_eq!(stats.stored, 3);
            assert_eq!(stats.rejected, 1);
            assert_eq!(stats.completed_reviews, 4);
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[test]
fn test_changed_input_is_refused() {
    let dir = TempDir::new().unwrap();
    let data = write_hotels(dir.path(), &sample_rows());

    {
        let mut pipeline = open(&data, MockGenerator::new());
        awaiting(&mut pipeline);
        pipeline.resume(Decision::Accept).unwrap();
    }

    let mut rows = sample_rows();
    rows.push("a5,Late Addition,Faro,Portugal,,,3,8.0,8.0,8.0,8.0,8.0,8.0");
    write_hotels(dir.path(), &rows);

    let batch = RecordReader::new().read_file(&data).unwrap();
    let mut pipeline =
        ReviewPipeline::new(MockGenerator::new(), FilePersistence::for_data_file(&data));
    let result = pipeline.restore(batch.source.as_ref());

    assert!(matches!(result, Err(VettedError::CheckpointMismatch { .. })));
    assert!(pipeline.items().is_empty());
}

#[test]
fn test_completed_checkpoint_resumes_complete() {
    let dir = TempDir::new().unwrap();
    let data = write_hotels(dir.path(), &sample_rows()[..2]);

    {
        let mut pipeline = open(&data, MockGenerator::new());
        while let Progress::AwaitingHuman(_) = pipeline.advance().unwrap() {
            pipeline.resume(Decision::Accept).unwrap();
        }
    }

    let generator = MockGenerator::new();
    let mut pipeline = open(&data, generator.clone());
    assert!(matches!(pipeline.advance().unwrap(), Progress::Complete(_)));
    assert_eq!(generator.call_count(), 0);
    assert!(pipeline.current().is_none());
}

#[test]
fn test_malformed_rows_are_rejected_and_persisted() {
    let dir = TempDir::new().unwrap();
    let data = write_hotels(
        dir.path(),
        &[
            "b1,Blank Inn,,,,,,,,,,,",
            "b2,Hotel Lumen,Lisbon,Portugal,,,4,8.7,8.2,7.9,9.3,9.1,8.1",
        ],
    );

    {
        let mut pipeline = open(&data, MockGenerator::new());
        assert_eq!(awaiting(&mut pipeline), 1);
    }

    let persistence = FilePersistence::for_data_file(&data);
    let checkpoint = persistence.load().unwrap().unwrap();
    assert_eq!(checkpoint.items[0].status, ReviewStatus::Rejected);
    assert_eq!(checkpoint.items[1].status, ReviewStatus::AwaitingHuman);
    assert_eq!(checkpoint.completed_reviews, 1);
}

// =============================================================================
// Output file
// =============================================================================

#[test]
fn test_output_file_holds_approved_summaries() {
    let dir = TempDir::new().unwrap();
    let data = write_hotels(dir.path(), &sample_rows()[..3]);
    let mut pipeline = open(&data, MockGenerator::new());

    awaiting(&mut pipeline);
    pipeline.resume(Decision::Accept).unwrap();
    awaiting(&mut pipeline);
    pipeline.resume(Decision::reject_silently()).unwrap();
    awaiting(&mut pipeline);
    pipeline
        .resume(Decision::edit("Hotel Miradouro, a 5-star stay in Lisbon, \"quoted\"."))
        .unwrap();

    let persistence = FilePersistence::for_data_file(&data);
    let rows = persistence.load_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].hotel_id, "a1");
    assert_eq!(rows[0].status, "accepted");
    assert_eq!(rows[0].final_summary, rows[0].draft_summary);
    assert_eq!(rows[1].hotel_id, "a3");
    assert_eq!(rows[1].status, "edited");
    assert_eq!(
        rows[1].final_summary,
        "Hotel Miradouro, a 5-star stay in Lisbon, \"quoted\"."
    );
    assert!(rows.iter().all(|r| r.flags().is_ok()));
    assert!(chrono::DateTime::parse_from_rfc3339(&rows[0].review_timestamp).is_ok());

    assert!(checkpoint_path(&data).exists());
    assert!(persistence.reset().unwrap());
    assert!(!checkpoint_path(&data).exists());
}
