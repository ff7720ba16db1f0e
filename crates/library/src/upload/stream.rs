use crate::error::{ErrorKind, Result};
use crate::layout::{MediaClass, MediaFile};
use crate::model::RetainedModel;
use crate::naming::NameLedger;
use crate::upload::file::{FileReport, RunState, process_file};
use crate::upload::{RunSummary, Session};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;

/// Progress events emitted by [`upload`] as it works through a card.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`IndexFetched`](Self::IndexFetched), exactly once.
/// 3. For stills and then videos: [`PassStarted`](Self::PassStarted), one
///    [`Processed`](Self::Processed) per file, [`PassComplete`](Self::PassComplete).
/// 4. [`Complete`](Self::Complete), exactly once, signalling the stream is
///    finished.
///
/// An error terminates the stream early, in which case [`Complete`](Self::Complete)
/// is never emitted.
#[derive(Debug)]
pub enum UploadEvent {
    Started,
    /// The target's index was fetched; nothing is uploaded before this.
    IndexFetched { entries: usize },
    PassStarted { class: MediaClass, files: usize },
    Processed(FileReport),
    PassComplete { class: MediaClass },
    Complete(RunSummary),
}

/// Streams [`UploadEvent`]s while uploading every still image and then every
/// video of the card described by `session`.
///
/// Files are processed strictly one after another. The stills pass always
/// finishes before the video pass starts, so videos without a model tag can
/// use the model of the last still image.
///
/// Only run-level problems are `Err` items, and they end the stream: a card
/// without `DCIM/`, or an index that can't be fetched. Unreadable directory
/// entries are logged and skipped. A single file's failure is reported in its
/// [`FileOutcome`](crate::FileOutcome).
pub fn upload(session: &Session) -> impl Stream<Item = Result<UploadEvent>> + '_ {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(UploadEvent::Started);

        // Checks for DCIM/ before anything talks to the target.
        let stills = match session.layout.stills().await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let index = match session
            .target
            .fetch_index()
            .await
            .or_raise(|| ErrorKind::Index(session.target.name().to_string()))
        {
            Ok(index) => index,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        tracing::info!(target = session.target.name(), entries = index.len(), hash = %index.hash_type(), "Fetched target index");
        yield Ok(UploadEvent::IndexFetched { entries: index.len() });

        let mut state = RunState {
            index: &index,
            ledger: NameLedger::new(index.iter().map(|(path, digest)| (path.to_path_buf(), digest.clone()))),
            retained: RetainedModel::default(),
        };
        let mut summary = RunSummary::default();

        yield Ok(UploadEvent::PassStarted { class: MediaClass::Still, files: stills.len() });
        for file in stills {
            let report = process(session, &mut state, &mut summary, file).await;
            yield Ok(UploadEvent::Processed(report));
        }
        yield Ok(UploadEvent::PassComplete { class: MediaClass::Still });

        let videos = session.layout.videos().await;
        yield Ok(UploadEvent::PassStarted { class: MediaClass::Video, files: videos.len() });
        for file in videos {
            let report = process(session, &mut state, &mut summary, file).await;
            yield Ok(UploadEvent::Processed(report));
        }
        yield Ok(UploadEvent::PassComplete { class: MediaClass::Video });

        yield Ok(UploadEvent::Complete(summary));
    })
}

async fn process(session: &Session, state: &mut RunState<'_>, summary: &mut RunSummary, file: MediaFile) -> FileReport {
    let outcome = process_file(session, state, &file).await;
    summary.record(&outcome);
    FileReport { file, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::layout::MountLayout;
    use crate::model::ModelRules;
    use crate::upload::{FileOutcome, SkipReason};
    use camsync_metadata::{Extractor, StaticReader};
    use camsync_storage::target::MockTarget;
    use camsync_storage::{HashType, hash_bytes};
    use futures::StreamExt;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use time::macros::offset;

    const STILL: &str = "DCIM/100MSDCF/IMG_0001.JPG";
    const CLIP: &str = "DCIM/100MSDCF/CLIP0001.MP4";

    fn card(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let card = tempfile::tempdir().unwrap();
        for (file, content) in files {
            let path = card.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        card
    }

    fn rx100_reader() -> StaticReader {
        StaticReader::new()
            .with_file(
                "IMG_0001.JPG",
                [
                    ("EXIF:Make", "SONY"),
                    ("EXIF:Model", "SONY DSC-RX100"),
                    ("EXIF:DateTimeOriginal", "2023:06:01 14:30:00"),
                ],
            )
            .with_file("CLIP0001.MP4", [("File:FileModifyDate", "2023:06:02 09:00:00+02:00")])
    }

    fn session(card: &Path, target: &Arc<MockTarget>, reader: &Arc<StaticReader>) -> Session {
        Session {
            layout: MountLayout::new(card, &["JPG".to_string()], &["MP4".to_string()]),
            target: target.clone(),
            reader: reader.clone(),
            extractor: Extractor::new("EXIF:DateTimeOriginal", offset!(+1)),
            rules: ModelRules::default(),
        }
    }

    async fn run(session: &Session) -> Vec<std::result::Result<UploadEvent, Error>> {
        upload(session).collect().await
    }

    fn summary(events: &[std::result::Result<UploadEvent, Error>]) -> RunSummary {
        match events.last() {
            Some(Ok(UploadEvent::Complete(summary))) => *summary,
            other => panic!("run did not complete: {other:?}"),
        }
    }

    fn destinations(copies: Vec<(PathBuf, PathBuf)>) -> Vec<String> {
        copies.into_iter().map(|(_, destination)| destination.to_string_lossy().into_owned()).collect()
    }

    #[tokio::test]
    async fn test_still_then_video() {
        let card = card(&[(STILL, b"still"), (CLIP, b"video")]);
        let target = Arc::new(MockTarget::new(HashType::Md5));
        let reader = Arc::new(rx100_reader());
        let events = run(&session(card.path(), &target, &reader)).await;

        assert_eq!(
            destinations(target.copies().await),
            vec!["20230601_143000_RX100_IMG_0001.jpg", "20230602_090000_RX100_CLIP0001.mp4"]
        );
        assert_eq!(target.copies().await[0].0, card.path().join(STILL));
        assert_eq!(summary(&events).uploaded, 2);
        assert_eq!(target.index_fetches(), 1);
    }

    #[tokio::test]
    async fn test_event_order() {
        let card = card(&[(STILL, b"still"), (CLIP, b"video")]);
        let target = Arc::new(MockTarget::new(HashType::Md5));
        let reader = Arc::new(rx100_reader());
        let events = run(&session(card.path(), &target, &reader)).await;

        let kinds: Vec<String> = events
            .iter()
            .map(|event| match event {
                Ok(UploadEvent::Started) => "started".to_string(),
                Ok(UploadEvent::IndexFetched { entries }) => format!("index {entries}"),
                Ok(UploadEvent::PassStarted { class, files }) => format!("{class} {files}"),
                Ok(UploadEvent::Processed(report)) => report.file.file_name(),
                Ok(UploadEvent::PassComplete { class }) => format!("{class} done"),
                Ok(UploadEvent::Complete(_)) => "complete".to_string(),
                Err(e) => panic!("unexpected error: {e:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "started",
                "index 0",
                "still 1",
                "IMG_0001.JPG",
                "still done",
                "video 1",
                "CLIP0001.MP4",
                "video done",
                "complete"
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_skip_metadata_and_copy() {
        let card = card(&[(STILL, b"still"), (CLIP, b"video")]);
        let known = hash_bytes(HashType::Md5, b"still");
        let target = Arc::new(MockTarget::with_entries(HashType::Md5, [("2023/renamed-by-hand.jpg", known)]));
        let reader = Arc::new(rx100_reader());
        let events = run(&session(card.path(), &target, &reader)).await;

        assert_eq!(reader.reads(), vec!["CLIP0001.MP4"]);
        // No still was processed, so the video can't borrow its model.
        assert_eq!(destinations(target.copies().await), vec!["20230602_090000_UNKNOWN_CLIP0001.mp4"]);
        let summary = summary(&events);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.total(), 2);
    }

    #[tokio::test]
    async fn test_video_model_tag_beats_retained_model() {
        let card = card(&[(STILL, b"still"), (CLIP, b"video")]);
        let target = Arc::new(MockTarget::new(HashType::Md5));
        let reader = Arc::new(rx100_reader().with_file(
            "CLIP0001.MP4",
            [
                ("QuickTime:CreationDate", "2023:06:02 09:00:00+02:00"),
                ("XML:DeviceManufacturer", "Sony"),
                ("XML:DeviceModelName", "ILCE-7M4"),
            ],
        ));
        run(&session(card.path(), &target, &reader)).await;
        assert_eq!(destinations(target.copies().await)[1], "20230602_090000_ILCE-7M4_CLIP0001.mp4");
    }

    #[tokio::test]
    async fn test_missing_dcim_aborts_before_index() {
        let card = card(&[("PRIVATE/M4ROOT/CLIP/C0001.MP4", b"video")]);
        let target = Arc::new(MockTarget::new(HashType::Md5));
        let reader = Arc::new(rx100_reader());
        let events = run(&session(card.path(), &target, &reader)).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(UploadEvent::Started)));
        assert!(matches!(&events[1], Err(e) if matches!(&**e, ErrorKind::NoDcim(_))));
        assert_eq!(target.index_fetches(), 0);
        assert!(reader.reads().is_empty());
    }

    #[tokio::test]
    async fn test_index_failure_aborts() {
        let card = card(&[(STILL, b"still")]);
        let target = Arc::new(MockTarget::new(HashType::Md5).with_failing_index());
        let reader = Arc::new(rx100_reader());
        let events = run(&session(card.path(), &target, &reader)).await;

        assert!(matches!(events.last(), Some(Err(e)) if matches!(&**e, ErrorKind::Index(name) if name == "mock")));
        assert!(!events.iter().any(|event| matches!(event, Ok(UploadEvent::Processed(_)))));
        assert!(target.copies().await.is_empty());
        assert!(reader.reads().is_empty());
    }

    #[tokio::test]
    async fn test_file_failures_do_not_stop_the_run() {
        let card = card(&[
            ("DCIM/100MSDCF/IMG_0000.JPG", b"no metadata"),
            (STILL, b"still"),
            ("DCIM/100MSDCF/IMG_0002.JPG", b"rejected"),
            (CLIP, b"video"),
        ]);
        let target = Arc::new(MockTarget::new(HashType::Md5).with_failing_copy("20230601_143001_RX100_IMG_0002.jpg"));
        let reader = Arc::new(rx100_reader().with_file(
            "IMG_0002.JPG",
            [
                ("EXIF:Make", "SONY"),
                ("EXIF:Model", "SONY DSC-RX100"),
                ("EXIF:DateTimeOriginal", "2023:06:01 14:30:01"),
            ],
        ));
        let events = run(&session(card.path(), &target, &reader)).await;

        let outcomes: Vec<&FileOutcome> = events
            .iter()
            .filter_map(|event| match event {
                Ok(UploadEvent::Processed(report)) => Some(&report.outcome),
                _ => None,
            })
            .collect();
        assert!(matches!(outcomes[0], FileOutcome::Skipped(SkipReason::Metadata(_))));
        assert!(outcomes[1].is_uploaded());
        assert!(matches!(outcomes[2], FileOutcome::Failed(_)));
        assert!(outcomes[3].is_uploaded());

        let summary = summary(&events);
        assert_eq!(
            summary,
            RunSummary {
                uploaded: 2,
                duplicates: 0,
                unreadable: 0,
                metadata: 1,
                failed: 1,
            }
        );
        assert!(summary.has_problems());
    }

    #[tokio::test]
    async fn test_name_taken_by_other_content() {
        let card = card(&[(STILL, b"still")]);
        let other = hash_bytes(HashType::Md5, b"a different photo");
        let target = Arc::new(MockTarget::with_entries(HashType::Md5, [("20230601_143000_RX100_IMG_0001.jpg", other)]));
        let reader = Arc::new(rx100_reader());
        run(&session(card.path(), &target, &reader)).await;

        let ours = hash_bytes(HashType::Md5, b"still");
        assert_eq!(
            destinations(target.copies().await),
            vec![format!("20230601_143000_RX100_IMG_0001_{}.jpg", ours.short())]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_link_does_not_stop_the_run() {
        let card = card(&[(STILL, b"still"), (CLIP, b"video")]);
        std::os::unix::fs::symlink(card.path().join("gone"), card.path().join("DCIM/100MSDCF/IMG_0002.JPG")).unwrap();
        let target = Arc::new(MockTarget::new(HashType::Md5));
        let reader = Arc::new(rx100_reader());
        let events = run(&session(card.path(), &target, &reader)).await;

        assert!(events.iter().all(|event| event.is_ok()));
        assert_eq!(
            destinations(target.copies().await),
            vec!["20230601_143000_RX100_IMG_0001.jpg", "20230602_090000_RX100_CLIP0001.mp4"]
        );
        assert_eq!(summary(&events).uploaded, 2);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let card = card(&[(STILL, b"still"), (CLIP, b"video")]);
        let first = Arc::new(MockTarget::new(HashType::Md5));
        let reader = Arc::new(rx100_reader());
        run(&session(card.path(), &first, &reader)).await;

        // A second run against a target holding the first run's uploads.
        let uploaded = [(STILL, b"still".as_slice()), (CLIP, b"video".as_slice())];
        let entries = first
            .copies()
            .await
            .into_iter()
            .zip(uploaded)
            .map(|((_, destination), (_, content))| (destination, hash_bytes(HashType::Md5, content)));
        let second = Arc::new(MockTarget::with_entries(HashType::Md5, entries));
        let events = run(&session(card.path(), &second, &reader)).await;

        assert!(second.copies().await.is_empty());
        assert_eq!(summary(&events).duplicates, 2);
    }
}
