// JourneyController - owns the session, guards transitions, runs generation calls

use super::catalog::Catalogs;
use super::session::Session;
use super::types::{ActionOutcome, Notice, Rejection, Screen};
use crate::generation::{GenerationError, ImageGenerator};
use crate::media::{EncodedImage, MediaEncoder};
use crate::share::{ShareError, ShareOutcome, Sharer};
use futures_util::Stream;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

const PHOTO_READ_NOTICE: &str = "We couldn't read that picture. Please choose another one.";

/// The three generation calls and what each one means for the journey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Flower,
    Bouquet,
    Comic,
}

impl Job {
    fn origin(self) -> Screen {
        match self {
            Job::Flower => Screen::Journey,
            Job::Bouquet => Screen::FlowerResult,
            Job::Comic => Screen::UploadPicture,
        }
    }

    fn destination(self) -> Screen {
        match self {
            Job::Flower => Screen::FlowerResult,
            Job::Bouquet => Screen::BouquetResult,
            Job::Comic => Screen::ComicResult,
        }
    }

    fn loading_message(self) -> &'static str {
        match self {
            Job::Flower => "Creating a magical surprise...",
            Job::Bouquet => "Perfecting your gift...",
            Job::Comic => "Drawing our story into a comic...",
        }
    }

    fn failure_notice(self) -> &'static str {
        match self {
            Job::Flower => "Something went wrong. Let's try again!",
            Job::Bouquet => "The florist is busy. Let's try once more!",
            Job::Comic => "The artist needs a break. Let's try generating again!",
        }
    }

    fn store(self, session: &mut Session, image: EncodedImage) {
        match self {
            Job::Flower => session.flower_image = Some(image),
            Job::Bouquet => session.bouquet_image = Some(image),
            Job::Comic => session.comic_image = Some(image),
        }
    }
}

/// Inputs captured at dispatch time
enum Request {
    Flower {
        flower: String,
        color: String,
    },
    Bouquet {
        flower: String,
        color: String,
        recipient: String,
    },
    Comic {
        user_photo: EncodedImage,
        partner_photo: Option<EncodedImage>,
        flower: String,
        color: String,
    },
}

/// Which photo slot a picture goes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSlot {
    User,
    Partner,
}

/// Releases the latch if a generation future is dropped before it finishes
struct LatchGuard<'a> {
    state: &'a watch::Sender<Session>,
    previous_message: Option<String>,
}

impl LatchGuard<'_> {
    /// Release the latch and apply the outcome in the same update
    fn release_with(mut self, apply: impl FnOnce(&mut Session)) {
        let previous_message = self.previous_message.take().unwrap_or_default();
        self.state.send_modify(|session| {
            session.is_generating = false;
            session.loading_message = previous_message;
            apply(session);
        });
    }
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous_message) = self.previous_message.take() {
            tracing::warn!("Generation abandoned before completion, releasing latch");
            self.state.send_modify(|session| {
                session.is_generating = false;
                session.loading_message = previous_message;
            });
        }
    }
}

/// Drives one journey.
///
/// All methods take `&self`; the session lives in a watch channel so every
/// change is published to subscribers as a new snapshot. The generation
/// latch is checked and set inside a single channel update, so overlapping
/// generation triggers see it and return [`ActionOutcome::Busy`].
pub struct JourneyController {
    state: watch::Sender<Session>,
    generator: Arc<dyn ImageGenerator>,
    encoder: MediaEncoder,
    catalogs: Catalogs,
    fallback_partner_photo: Option<EncodedImage>,
}

impl JourneyController {
    pub fn new(generator: Arc<dyn ImageGenerator>, catalogs: Catalogs) -> Self {
        let (state, _) = watch::channel(Session::new(&catalogs));
        Self {
            state,
            generator,
            encoder: MediaEncoder::new(),
            catalogs,
            fallback_partner_photo: None,
        }
    }

    /// Partner picture sent with the comic request when none was uploaded
    pub fn with_fallback_partner_photo(mut self, photo: EncodedImage) -> Self {
        self.fallback_partner_photo = Some(photo);
        self
    }

    /// Current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Stream of snapshots published after this call; ends when the controller is dropped
    pub fn updates(&self) -> impl Stream<Item = Session> + Send + use<> {
        futures_util::stream::unfold(self.state.subscribe(), |mut rx| async move {
            rx.changed().await.ok()?;
            let session = rx.borrow_and_update().clone();
            Some((session, rx))
        })
    }

    // Screen transitions without side effects

    pub fn start(&self) -> ActionOutcome {
        self.advance(Screen::Welcome, Screen::Journey)
    }

    /// Back from the flower to try another combination
    pub fn retry(&self) -> ActionOutcome {
        self.advance(Screen::FlowerResult, Screen::Journey)
    }

    pub fn proceed(&self) -> ActionOutcome {
        self.advance(Screen::BouquetResult, Screen::Final)
    }

    /// "Yes!" on the final question
    pub fn accept(&self) -> ActionOutcome {
        self.advance(Screen::Final, Screen::UploadPicture)
    }

    /// Throw the whole session away and begin again
    pub fn restart(&self) -> ActionOutcome {
        let mut outcome = ActionOutcome::Busy;
        self.state.send_if_modified(|session| {
            if let Err(refused) = check_screen(session, Screen::ComicResult) {
                outcome = refused;
                return false;
            }
            *session = Session::new(&self.catalogs);
            outcome = ActionOutcome::Advanced(Screen::Welcome);
            true
        });

        if outcome.is_advanced() {
            tracing::info!("Session restarted");
        }
        outcome
    }

    fn advance(&self, from: Screen, to: Screen) -> ActionOutcome {
        let mut outcome = ActionOutcome::Busy;
        self.state.send_if_modified(|session| {
            if let Err(refused) = check_screen(session, from) {
                outcome = refused;
                return false;
            }
            session.screen = to;
            outcome = ActionOutcome::Advanced(to);
            true
        });

        if outcome.is_advanced() {
            tracing::info!("Screen: {} -> {}", from, to);
        }
        outcome
    }

    // Inputs

    pub fn set_user_name(&self, name: impl Into<String>) -> ActionOutcome {
        let name = name.into();
        self.state.send_modify(|session| session.user_name = name);
        ActionOutcome::Updated
    }

    pub fn next_flower(&self) -> ActionOutcome {
        self.update(|session| {
            session.flower.next();
        })
    }

    pub fn previous_flower(&self) -> ActionOutcome {
        self.update(|session| {
            session.flower.previous();
        })
    }

    pub fn next_color(&self) -> ActionOutcome {
        self.update(|session| {
            session.color.next();
        })
    }

    pub fn previous_color(&self) -> ActionOutcome {
        self.update(|session| {
            session.color.previous();
        })
    }

    pub fn dismiss_notice(&self) -> ActionOutcome {
        self.update(|session| session.notice = None)
    }

    fn update(&self, change: impl FnOnce(&mut Session)) -> ActionOutcome {
        self.state.send_modify(change);
        ActionOutcome::Updated
    }

    // Photos

    pub async fn attach_user_photo(&self, path: impl AsRef<Path>) -> ActionOutcome {
        self.attach_photo(PhotoSlot::User, path.as_ref()).await
    }

    pub async fn attach_partner_photo(&self, path: impl AsRef<Path>) -> ActionOutcome {
        self.attach_photo(PhotoSlot::Partner, path.as_ref()).await
    }

    pub fn clear_user_photo(&self) -> ActionOutcome {
        self.update(|session| session.user_photo = None)
    }

    pub fn clear_partner_photo(&self) -> ActionOutcome {
        self.update(|session| session.partner_photo = None)
    }

    pub async fn attach_photo(&self, slot: PhotoSlot, path: &Path) -> ActionOutcome {
        match self.encoder.encode_file(path).await {
            Ok(image) => {
                tracing::info!("Attached {:?} photo ({} bytes)", slot, image.len());
                self.update(|session| match slot {
                    PhotoSlot::User => session.user_photo = Some(image),
                    PhotoSlot::Partner => session.partner_photo = Some(image),
                })
            }
            Err(e) => {
                tracing::warn!("Photo intake failed: {}", e);
                self.fail(PHOTO_READ_NOTICE)
            }
        }
    }

    fn fail(&self, message: &str) -> ActionOutcome {
        let notice = Notice::new(message);
        let stored = notice.clone();
        self.state.send_modify(|session| session.notice = Some(stored));
        ActionOutcome::Failed(notice)
    }

    // Generation

    /// Create the single flower from the chosen kind and color
    pub async fn generate_flower(&self) -> ActionOutcome {
        self.generate(Job::Flower).await
    }

    /// "Continue" on the flower screen: create the named bouquet
    pub async fn continue_to_bouquet(&self) -> ActionOutcome {
        self.generate(Job::Bouquet).await
    }

    /// Create the proposal comic from the uploaded photos
    pub async fn generate_comic(&self) -> ActionOutcome {
        self.generate(Job::Comic).await
    }

    async fn generate(&self, job: Job) -> ActionOutcome {
        let mut admitted: Result<(Request, String), ActionOutcome> = Err(ActionOutcome::Busy);

        self.state.send_if_modified(|session| match self.admit(job, session) {
            Ok(request) => {
                session.is_generating = true;
                let previous =
                    std::mem::replace(&mut session.loading_message, job.loading_message().to_string());
                session.notice = None;
                admitted = Ok((request, previous));
                true
            }
            Err(refused) => {
                admitted = Err(refused);
                false
            }
        });

        let (request, previous_message) = match admitted {
            Ok(admitted) => admitted,
            Err(refused) => {
                tracing::debug!("{:?} generation not dispatched: {:?}", job, refused);
                return refused;
            }
        };

        let guard = LatchGuard {
            state: &self.state,
            previous_message: Some(previous_message),
        };

        tracing::info!("Dispatching {:?} generation", job);
        let result = self.dispatch(&request).await;

        let mut outcome = ActionOutcome::Busy;
        guard.release_with(|session| match result {
            Ok(Some(image)) => {
                job.store(session, image);
                session.screen = job.destination();
                outcome = ActionOutcome::Advanced(job.destination());
            }
            Ok(None) => {
                tracing::warn!("{:?} generation produced no image", job);
                let notice = Notice::new(job.failure_notice());
                session.notice = Some(notice.clone());
                outcome = ActionOutcome::Failed(notice);
            }
            Err(e) => {
                tracing::warn!("{:?} generation failed: {}", job, e);
                let notice = Notice::new(job.failure_notice());
                session.notice = Some(notice.clone());
                outcome = ActionOutcome::Failed(notice);
            }
        });

        if let ActionOutcome::Advanced(screen) = &outcome {
            tracing::info!("Screen: {} -> {}", job.origin(), screen);
        }
        outcome
    }

    /// Guards, in order: latch, screen, inputs
    fn admit(&self, job: Job, session: &Session) -> Result<Request, ActionOutcome> {
        if session.is_generating {
            return Err(ActionOutcome::Busy);
        }
        check_screen(session, job.origin())?;

        let flower = session.selected_flower().to_string();
        let color = session.selected_color().to_string();

        match job {
            Job::Flower => {
                if !session.has_name() {
                    return Err(ActionOutcome::Rejected(Rejection::EmptyName));
                }
                Ok(Request::Flower { flower, color })
            }
            Job::Bouquet => Ok(Request::Bouquet {
                flower,
                color,
                recipient: session.trimmed_name().to_string(),
            }),
            Job::Comic => {
                let user_photo = session
                    .user_photo
                    .clone()
                    .ok_or(ActionOutcome::Rejected(Rejection::MissingPhoto))?;
                let partner_photo = session
                    .partner_photo
                    .clone()
                    .or_else(|| self.fallback_partner_photo.clone());
                Ok(Request::Comic {
                    user_photo,
                    partner_photo,
                    flower,
                    color,
                })
            }
        }
    }

    async fn dispatch(&self, request: &Request) -> Result<Option<EncodedImage>, GenerationError> {
        match request {
            Request::Flower { flower, color } => self.generator.flower(flower, color).await,
            Request::Bouquet {
                flower,
                color,
                recipient,
            } => self.generator.bouquet(flower, color, recipient).await,
            Request::Comic {
                user_photo,
                partner_photo,
                flower,
                color,
            } => {
                self.generator
                    .comic(user_photo, partner_photo.as_ref(), flower, color)
                    .await
            }
        }
    }

    // Sharing

    /// Share the comic, or download it where sharing is unavailable
    pub async fn share_comic(&self, sharer: &Sharer) -> Result<ShareOutcome, ShareError> {
        let comic = self.state.borrow().comic_image.clone();
        match comic {
            Some(image) => sharer.share(&image).await,
            None => Ok(ShareOutcome::NothingToShare),
        }
    }
}

fn check_screen(session: &Session, expected: Screen) -> Result<(), ActionOutcome> {
    if session.is_generating {
        return Err(ActionOutcome::Busy);
    }
    if session.screen != expected {
        return Err(ActionOutcome::Rejected(Rejection::WrongScreen {
            expected,
            actual: session.screen,
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::{DownloadFallback, NoNativeShare, COMIC_FILENAME};
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Generator double that counts calls and can fail, return nothing, or wait on a gate
    #[derive(Default)]
    struct FakeGenerator {
        calls: AtomicUsize,
        fail: AtomicBool,
        no_image: AtomicBool,
        gate: Option<Arc<Notify>>,
        comic_partners: Mutex<Vec<Option<Vec<u8>>>>,
        recipients: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn respond(&self, tag: u8) -> Result<Option<EncodedImage>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(GenerationError::NetworkError("connection reset".into()));
            }
            if self.no_image.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(Some(EncodedImage::new("image/png", vec![tag])))
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn flower(
            &self,
            _flower: &str,
            _color: &str,
        ) -> Result<Option<EncodedImage>, GenerationError> {
            self.respond(1).await
        }

        async fn bouquet(
            &self,
            _flower: &str,
            _color: &str,
            recipient: &str,
        ) -> Result<Option<EncodedImage>, GenerationError> {
            self.recipients.lock().unwrap().push(recipient.to_string());
            self.respond(2).await
        }

        async fn comic(
            &self,
            _user_photo: &EncodedImage,
            partner_photo: Option<&EncodedImage>,
            _flower: &str,
            _color: &str,
        ) -> Result<Option<EncodedImage>, GenerationError> {
            self.comic_partners
                .lock()
                .unwrap()
                .push(partner_photo.map(|p| p.bytes().to_vec()));
            self.respond(3).await
        }
    }

    fn controller(generator: Arc<FakeGenerator>) -> JourneyController {
        JourneyController::new(generator, Catalogs::default())
    }

    async fn drive_to_upload(controller: &JourneyController) {
        assert!(controller.start().is_advanced());
        controller.set_user_name("Alex");
        assert!(controller.generate_flower().await.is_advanced());
        assert!(controller.continue_to_bouquet().await.is_advanced());
        assert!(controller.proceed().is_advanced());
        assert!(controller.accept().is_advanced());
        assert_eq!(controller.snapshot().screen, Screen::UploadPicture);
    }

    fn photo_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_starts_on_welcome() {
        let controller = controller(Arc::new(FakeGenerator::default()));
        let session = controller.snapshot();
        assert_eq!(session, Session::new(&Catalogs::default()));
        assert_eq!(controller.start(), ActionOutcome::Advanced(Screen::Journey));
        assert_eq!(
            controller.start(),
            ActionOutcome::Rejected(Rejection::WrongScreen {
                expected: Screen::Welcome,
                actual: Screen::Journey,
            })
        );
    }

    #[tokio::test]
    async fn test_blank_name_refuses_flower() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        controller.start();

        for name in ["", "   ", "\t\n"] {
            controller.set_user_name(name);
            let before = controller.snapshot();
            assert_eq!(
                controller.generate_flower().await,
                ActionOutcome::Rejected(Rejection::EmptyName)
            );
            assert_eq!(controller.snapshot(), before);
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_alex_rose_crimson_flower() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        controller.start();
        controller.set_user_name("Alex");

        let session = controller.snapshot();
        assert_eq!(session.selected_flower(), "Rose");
        assert_eq!(session.selected_color(), "Crimson Red");

        assert_eq!(
            controller.generate_flower().await,
            ActionOutcome::Advanced(Screen::FlowerResult)
        );
        let session = controller.snapshot();
        assert_eq!(session.screen, Screen::FlowerResult);
        assert!(session.flower_image.is_some());
        assert!(!session.is_generating);
        assert!(session.loading_message.is_empty());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_generation_is_ignored() {
        let gate = Arc::new(Notify::new());
        let generator = Arc::new(FakeGenerator::gated(gate.clone()));
        let controller = controller(generator.clone());
        controller.start();
        controller.set_user_name("Alex");

        let first = controller.generate_flower();
        tokio::pin!(first);
        assert!(futures_util::poll!(first.as_mut()).is_pending());

        let session = controller.snapshot();
        assert!(session.is_generating);
        assert_eq!(session.loading_message, "Creating a magical surprise...");

        assert_eq!(controller.generate_flower().await, ActionOutcome::Busy);
        assert_eq!(controller.retry(), ActionOutcome::Busy);
        assert_eq!(controller.start(), ActionOutcome::Busy);

        gate.notify_one();
        assert_eq!(first.await, ActionOutcome::Advanced(Screen::FlowerResult));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_pending_comic_blocks_other_generations() {
        let gate = Arc::new(Notify::new());
        let generator = Arc::new(FakeGenerator::gated(gate.clone()));
        let controller = controller(generator.clone());

        // A stored permit lets each call through without waiting
        controller.start();
        controller.set_user_name("Alex");
        gate.notify_one();
        assert!(controller.generate_flower().await.is_advanced());
        gate.notify_one();
        assert!(controller.continue_to_bouquet().await.is_advanced());
        controller.proceed();
        controller.accept();

        let dir = tempfile::tempdir().unwrap();
        let me = photo_file(&dir, "me.png", &[0x89, b'P', b'N', b'G']);
        controller.attach_user_photo(&me).await;

        let comic = controller.generate_comic();
        tokio::pin!(comic);
        assert!(futures_util::poll!(comic.as_mut()).is_pending());
        let calls = generator.calls();
        assert_eq!(calls, 3);

        let pending = controller.snapshot();
        assert!(pending.is_generating);
        assert_eq!(pending.loading_message, "Drawing our story into a comic...");

        assert_eq!(controller.generate_comic().await, ActionOutcome::Busy);
        assert_eq!(controller.continue_to_bouquet().await, ActionOutcome::Busy);
        assert_eq!(controller.generate_flower().await, ActionOutcome::Busy);
        assert_eq!(controller.restart(), ActionOutcome::Busy);
        assert_eq!(generator.calls(), calls);
        assert_eq!(controller.snapshot(), pending);

        // Edits stay available while the call is in flight
        assert_eq!(controller.set_user_name("Sam"), ActionOutcome::Updated);
        assert_eq!(controller.next_color(), ActionOutcome::Updated);
        let partner = photo_file(&dir, "him.png", &[0x89, b'P', b'N', b'G', 1]);
        assert_eq!(controller.attach_partner_photo(&partner).await, ActionOutcome::Updated);
        let edited = controller.snapshot();
        assert_eq!(edited.user_name, "Sam");
        assert!(edited.partner_photo.is_some());
        assert!(edited.is_generating);

        gate.notify_one();
        assert_eq!(comic.await, ActionOutcome::Advanced(Screen::ComicResult));
        assert_eq!(generator.calls(), calls);
        // Inputs were captured when the comic was dispatched
        assert_eq!(*generator.comic_partners.lock().unwrap(), vec![None]);
        assert!(!controller.snapshot().is_generating);
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_screen_and_allows_retry() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        controller.start();
        controller.set_user_name("Alex");
        controller.next_color();
        generator.fail.store(true, Ordering::SeqCst);

        let before = controller.snapshot();
        let outcome = controller.generate_flower().await;
        let ActionOutcome::Failed(notice) = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(notice.message, "Something went wrong. Let's try again!");

        let mut after = controller.snapshot();
        assert!(!after.is_generating);
        assert_eq!(after.notice.as_ref(), Some(&notice));
        after.notice = None;
        assert_eq!(after, before);

        generator.fail.store(false, Ordering::SeqCst);
        assert!(controller.generate_flower().await.is_advanced());
        let session = controller.snapshot();
        assert!(session.notice.is_none());
        assert_eq!(session.selected_color(), "Soft Pink");
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_image_counts_as_failure() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        controller.start();
        controller.set_user_name("Alex");
        generator.no_image.store(true, Ordering::SeqCst);

        assert!(matches!(
            controller.generate_flower().await,
            ActionOutcome::Failed(_)
        ));
        let session = controller.snapshot();
        assert_eq!(session.screen, Screen::Journey);
        assert!(session.flower_image.is_none());
    }

    #[tokio::test]
    async fn test_bouquet_uses_trimmed_name_and_retry_returns_to_journey() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        controller.start();
        controller.set_user_name("  Alex ");
        controller.generate_flower().await;

        assert_eq!(controller.retry(), ActionOutcome::Advanced(Screen::Journey));
        controller.next_flower();
        controller.generate_flower().await;

        generator.fail.store(true, Ordering::SeqCst);
        let outcome = controller.continue_to_bouquet().await;
        assert!(matches!(outcome, ActionOutcome::Failed(ref n) if n.message.contains("florist")));
        assert_eq!(controller.snapshot().screen, Screen::FlowerResult);

        generator.fail.store(false, Ordering::SeqCst);
        assert_eq!(
            controller.continue_to_bouquet().await,
            ActionOutcome::Advanced(Screen::BouquetResult)
        );
        assert!(controller.snapshot().bouquet_image.is_some());
        assert_eq!(*generator.recipients.lock().unwrap(), vec!["Alex", "Alex"]);
    }

    #[tokio::test]
    async fn test_comic_refused_without_photo() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        drive_to_upload(&controller).await;
        let calls = generator.calls();

        let before = controller.snapshot();
        assert_eq!(
            controller.generate_comic().await,
            ActionOutcome::Rejected(Rejection::MissingPhoto)
        );
        assert_eq!(controller.snapshot(), before);
        assert_eq!(controller.snapshot().screen, Screen::UploadPicture);
        assert_eq!(generator.calls(), calls);
    }

    #[tokio::test]
    async fn test_comic_failure_keeps_upload_screen() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        drive_to_upload(&controller).await;

        let dir = tempfile::tempdir().unwrap();
        let path = photo_file(&dir, "me.png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(controller.attach_user_photo(&path).await, ActionOutcome::Updated);

        generator.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            controller.generate_comic().await,
            ActionOutcome::Failed(_)
        ));

        let session = controller.snapshot();
        assert_eq!(session.screen, Screen::UploadPicture);
        assert!(session.comic_image.is_none());
        assert!(!session.is_generating);
        assert!(session.user_photo.is_some());
    }

    #[tokio::test]
    async fn test_comic_partner_photo_and_fallback() {
        let generator = Arc::new(FakeGenerator::default());
        let fallback = EncodedImage::new("image/jpeg", vec![9, 9]);
        let controller = JourneyController::new(generator.clone(), Catalogs::default())
            .with_fallback_partner_photo(fallback);
        drive_to_upload(&controller).await;

        let dir = tempfile::tempdir().unwrap();
        let me = photo_file(&dir, "me.jpg", &[0xFF, 0xD8, 0xFF, 1]);
        let partner = photo_file(&dir, "him.jpg", &[0xFF, 0xD8, 0xFF, 2]);
        controller.attach_user_photo(&me).await;
        controller.attach_partner_photo(&partner).await;

        generator.fail.store(true, Ordering::SeqCst);
        controller.generate_comic().await;

        controller.clear_partner_photo();
        assert!(controller.snapshot().user_photo.is_some());
        generator.fail.store(false, Ordering::SeqCst);
        assert_eq!(
            controller.generate_comic().await,
            ActionOutcome::Advanced(Screen::ComicResult)
        );

        let partners = generator.comic_partners.lock().unwrap();
        assert_eq!(
            *partners,
            vec![Some(vec![0xFF, 0xD8, 0xFF, 2]), Some(vec![9, 9])]
        );
    }

    #[tokio::test]
    async fn test_photo_intake_and_clearing() {
        let controller = controller(Arc::new(FakeGenerator::default()));
        let dir = tempfile::tempdir().unwrap();
        let me = photo_file(&dir, "me.png", &[0x89, b'P', b'N', b'G']);
        let partner = photo_file(&dir, "him.gif", b"GIF89a");

        controller.attach_user_photo(&me).await;
        controller.attach_partner_photo(&partner).await;
        let session = controller.snapshot();
        assert_eq!(session.user_photo.as_ref().map(|p| p.mime_type()), Some("image/png"));
        assert_eq!(session.partner_photo.as_ref().map(|p| p.mime_type()), Some("image/gif"));

        controller.clear_user_photo();
        let session = controller.snapshot();
        assert!(session.user_photo.is_none());
        assert!(session.partner_photo.is_some());
        assert_eq!(session.screen, Screen::Welcome);

        let outcome = controller.attach_user_photo(dir.path().join("missing.png")).await;
        assert!(matches!(outcome, ActionOutcome::Failed(_)));
        let session = controller.snapshot();
        assert!(session.user_photo.is_none());
        assert_eq!(
            session.notice.map(|n| n.message),
            Some(PHOTO_READ_NOTICE.to_string())
        );

        controller.dismiss_notice();
        assert!(controller.snapshot().notice.is_none());
    }

    #[tokio::test]
    async fn test_restart_resets_everything() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator.clone());
        assert!(matches!(
            controller.restart(),
            ActionOutcome::Rejected(Rejection::WrongScreen { .. })
        ));

        controller.next_flower();
        controller.previous_color();
        drive_to_upload(&controller).await;

        let dir = tempfile::tempdir().unwrap();
        let me = photo_file(&dir, "me.png", &[0x89, b'P', b'N', b'G']);
        controller.attach_user_photo(&me).await;
        controller.generate_comic().await;
        assert_eq!(controller.snapshot().screen, Screen::ComicResult);

        assert_eq!(controller.restart(), ActionOutcome::Advanced(Screen::Welcome));
        assert_eq!(controller.snapshot(), Session::new(&Catalogs::default()));
    }

    #[tokio::test]
    async fn test_dropped_generation_releases_latch() {
        let gate = Arc::new(Notify::new());
        let generator = Arc::new(FakeGenerator::gated(gate));
        let controller = controller(generator.clone());
        controller.start();
        controller.set_user_name("Alex");

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), controller.generate_flower()).await;
        assert!(timed_out.is_err());

        let session = controller.snapshot();
        assert!(!session.is_generating);
        assert!(session.loading_message.is_empty());
        assert_eq!(session.screen, Screen::Journey);
    }

    #[tokio::test]
    async fn test_updates_publish_snapshots() {
        let controller = controller(Arc::new(FakeGenerator::default()));
        let mut updates = Box::pin(controller.updates());

        controller.start();
        let session = updates.next().await.unwrap();
        assert_eq!(session.screen, Screen::Journey);

        controller.next_flower();
        let session = updates.next().await.unwrap();
        assert_eq!(session.selected_flower(), "Tulip");

        drop(controller);
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn test_share_comic() {
        let generator = Arc::new(FakeGenerator::default());
        let controller = controller(generator);
        let dir = tempfile::tempdir().unwrap();
        let sharer = Sharer::new(Box::new(NoNativeShare), DownloadFallback::new(dir.path()), "t", "x");

        assert_eq!(
            controller.share_comic(&sharer).await.unwrap(),
            ShareOutcome::NothingToShare
        );

        drive_to_upload(&controller).await;
        let me = photo_file(&dir, "me.png", &[0x89, b'P', b'N', b'G']);
        controller.attach_user_photo(&me).await;
        controller.generate_comic().await;

        let outcome = controller.share_comic(&sharer).await.unwrap();
        assert_eq!(outcome, ShareOutcome::Downloaded(dir.path().join(COMIC_FILENAME)));
        assert_eq!(std::fs::read(dir.path().join(COMIC_FILENAME)).unwrap(), vec![3]);
    }
}
