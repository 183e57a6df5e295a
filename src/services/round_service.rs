//! Asynchronous driver of a [`RoundSession`]: question fetch, countdown,
//! auto-advance after a timeout and score recording.
//!
//! Every spawned task carries the round id and the session version it was
//! started for, and re-checks both under the round lock before touching the
//! session. Screen transitions always take the transition gate before the
//! round lock, so the completion path releases the round lock first.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::ScoreRecord,
    dto::{
        round::{RoundView, StartRoundRequest},
        sse::RoundFinishedEvent,
    },
    error::ServiceError,
    services::{
        daily::{daily_config_for, format_timestamp},
        leaderboard::{global_ranking, rank_of},
        question_source::{QuestionRequest, QuestionSourceResult},
        sse_events::{
            broadcast_round_finished, broadcast_round_phase, broadcast_round_points,
            broadcast_round_tick,
        },
    },
    state::{
        SharedState,
        game::{Question, RoundConfig},
        round::{AUTO_ADVANCE_DELAY, AnswerOutcome, RoundPhase, RoundSession, RoundStep},
        screen::ScreenEvent,
        transitions::run_transition_with_broadcast,
    },
};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Shown when a player tries the daily challenge twice on the same day.
pub const DAILY_ALREADY_COMPLETED: &str =
    "Anda sudah menyelesaikan Tantangan Harian hari ini. Kembali lagi besok!";
/// Shown when the question source rejected the credential.
pub const PERMISSION_DENIED_MESSAGE: &str = "Izin ditolak. Kunci API Anda mungkin tidak valid atau memerlukan penagihan. Silakan pilih kunci yang valid dan coba lagi.";

/// A round attached to the playing or finished screen, with the tasks driving it.
///
/// Dropping it aborts every pending task.
pub struct ActiveRound {
    id: Uuid,
    player: String,
    session: RoundSession,
    started_at: Instant,
    fetch: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
    auto_advance: Option<JoinHandle<()>>,
}

impl ActiveRound {
    fn new(player: String, config: RoundConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            player,
            session: RoundSession::new(config),
            started_at: Instant::now(),
            fetch: None,
            ticker: None,
            auto_advance: None,
        }
    }

    /// Identifier distinguishing this round from earlier ones.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the player the score will be recorded for.
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Underlying state machine.
    pub fn session(&self) -> &RoundSession {
        &self.session
    }

    /// Client projection of the round.
    pub fn view(&self) -> RoundView {
        RoundView::from((self.id, &self.session))
    }

    fn is_live(&self, id: Uuid, version: usize) -> bool {
        self.id == id && self.session.version() == version
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn stop_auto_advance(&mut self) {
        if let Some(handle) = self.auto_advance.take() {
            handle.abort();
        }
    }
}

impl Drop for ActiveRound {
    fn drop(&mut self) {
        for handle in [
            self.fetch.take(),
            self.ticker.take(),
            self.auto_advance.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

/// Everything needed to record a finished round once the round lock is released.
struct CompletedRound {
    id: Uuid,
    player: String,
    config: RoundConfig,
    score: u32,
    duration: u64,
}

/// Build the round configuration, check the daily gate and move to the playing screen.
pub async fn start_round(
    state: &SharedState,
    request: StartRoundRequest,
) -> Result<RoundView, ServiceError> {
    let player = state
        .player()
        .read()
        .await
        .clone()
        .ok_or_else(|| ServiceError::InvalidState("enter a name before starting a round".into()))?;

    let today = state.clock().today();
    let config = if request.mode.is_daily() {
        daily_config_for(today)
    } else {
        let difficulty = request
            .difficulty
            .ok_or_else(|| ServiceError::InvalidInput("difficulty is required".into()))?;
        let question_count = request
            .question_count
            .ok_or_else(|| ServiceError::InvalidInput("question count is required".into()))?;
        RoundConfig::new(request.juz, difficulty, question_count, request.mode)?
    };

    let view = run_transition_with_broadcast(state, ScreenEvent::StartRound, move || async move {
        if config.mode().is_daily()
            && state
                .persistent()
                .has_completed_daily(&player.name, today)
                .await
        {
            info!(player = %player.name, "daily challenge already completed today");
            return Err(ServiceError::InvalidState(DAILY_ALREADY_COMPLETED.into()));
        }

        let mut slot = state.round().lock().await;
        let mut round = ActiveRound::new(player.name, config);
        spawn_fetch(state, &mut round);
        let view = round.view();
        info!(
            round_id = %round.id,
            player = %round.player,
            mode = round.session.config().mode().label(),
            juz = ?round.session.config().juz(),
            "round started"
        );
        *slot = Some(round);
        Ok(view)
    })
    .await?;

    state.reroll_quote().await;
    broadcast_round_phase(state, &view);
    Ok(view)
}

/// Current round, if the playing or finished screen holds one.
pub async fn current_round(state: &SharedState) -> Result<RoundView, ServiceError> {
    let slot = state.round().lock().await;
    slot.as_ref()
        .map(ActiveRound::view)
        .ok_or_else(no_active_round)
}

/// Replace the pending option of the current question.
pub async fn select_option(state: &SharedState, option: String) -> Result<RoundView, ServiceError> {
    let mut slot = state.round().lock().await;
    let round = slot.as_mut().ok_or_else(no_active_round)?;
    round.session.select(option)?;
    Ok(round.view())
}

/// Commit the pending option and reveal the correct answer.
pub async fn submit_answer(state: &SharedState) -> Result<RoundView, ServiceError> {
    let mut slot = state.round().lock().await;
    let round = slot.as_mut().ok_or_else(no_active_round)?;
    let step = round.session.submit()?;
    round.stop_ticker();

    let view = round.view();
    let (round_id, score) = (round.id, round.session.score());
    drop(slot);

    if let RoundStep::Answered { points_gained, .. } = step {
        if points_gained > 0 {
            broadcast_round_points(state, round_id, points_gained, score);
        }
    }
    broadcast_round_phase(state, &view);
    Ok(view)
}

/// Leave a resolved question; records the score after the last one.
pub async fn next_question(state: &SharedState) -> Result<RoundView, ServiceError> {
    let mut slot = state.round().lock().await;
    let round = slot.as_mut().ok_or_else(no_active_round)?;
    let step = round.session.advance()?;
    round.stop_auto_advance();

    let completed = after_advance(state, round, step);
    let view = round.view();
    drop(slot);

    broadcast_round_phase(state, &view);
    if let Some(completed) = completed {
        complete_round(state, completed).await;
    }
    Ok(view)
}

/// Fetch the questions again after a failure.
pub async fn retry_round(state: &SharedState) -> Result<RoundView, ServiceError> {
    let mut slot = state.round().lock().await;
    let round = slot.as_mut().ok_or_else(no_active_round)?;
    round.session.retry()?;
    spawn_fetch(state, round);
    info!(round_id = %round.id, "retrying question fetch");

    let view = round.view();
    drop(slot);
    broadcast_round_phase(state, &view);
    Ok(view)
}

/// Leave the playing screen, discarding the round and anything still in flight.
pub async fn abandon_round(state: &SharedState) -> Result<(), ServiceError> {
    run_transition_with_broadcast(state, ScreenEvent::AbandonRound, || async {
        if let Some(round) = state.round().lock().await.take() {
            info!(round_id = %round.id, player = %round.player, "round abandoned");
        }
        Ok(())
    })
    .await
}

/// Install a new credential, then restart a round that failed on the previous one.
pub async fn reauthorize(
    state: &SharedState,
    api_key: String,
) -> Result<Option<RoundView>, ServiceError> {
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(ServiceError::InvalidInput("api key must not be empty".into()));
    }
    state.questions().set_credential(api_key);
    info!("question source credential replaced");

    let mut slot = state.round().lock().await;
    let Some(round) = slot.as_mut() else {
        return Ok(None);
    };
    let needs_retry = matches!(
        round.session.phase(),
        RoundPhase::Failed(failure) if failure.is_authorization()
    );
    if !needs_retry {
        return Ok(None);
    }

    round.session.retry()?;
    spawn_fetch(state, round);
    let view = round.view();
    drop(slot);
    broadcast_round_phase(state, &view);
    Ok(Some(view))
}

fn no_active_round() -> ServiceError {
    ServiceError::NotFound("no active round".into())
}

fn spawn_fetch(state: &SharedState, round: &mut ActiveRound) {
    let request = QuestionRequest::for_round(round.session.config());
    let fetch = state.questions().fetch(request);
    let (id, version) = (round.id, round.session.version());
    let state = state.clone();

    if let Some(previous) = round.fetch.replace(tokio::spawn(async move {
        let result = fetch.await;
        on_questions_loaded(&state, id, version, result).await;
    })) {
        previous.abort();
    }
}

async fn on_questions_loaded(
    state: &SharedState,
    id: Uuid,
    version: usize,
    result: QuestionSourceResult<Vec<Question>>,
) {
    let mut slot = state.round().lock().await;
    let Some(round) = slot.as_mut().filter(|round| round.is_live(id, version)) else {
        debug!(round_id = %id, "discarding question batch for a stale round");
        return;
    };
    round.fetch.take();

    match round.session.questions_loaded(result) {
        Ok(RoundStep::Started { question_count }) => {
            info!(round_id = %id, question_count, "questions loaded");
            spawn_ticker(state, round);
        }
        Ok(RoundStep::Failed(failure)) => {
            warn!(
                round_id = %id,
                authorization = failure.is_authorization(),
                reason = failure.message(),
                "question fetch failed"
            );
        }
        Ok(_) => {}
        Err(err) => warn!(round_id = %id, error = %err, "question batch rejected"),
    }

    let view = round.view();
    drop(slot);
    broadcast_round_phase(state, &view);
}

fn spawn_ticker(state: &SharedState, round: &mut ActiveRound) {
    round.stop_ticker();
    let (id, version) = (round.id, round.session.version());
    let state = state.clone();

    round.ticker = Some(tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        loop {
            interval.tick().await;
            if !on_tick(&state, id, version).await {
                break;
            }
        }
    }));
}

/// Apply one tick; returns whether the ticker should keep running.
async fn on_tick(state: &SharedState, id: Uuid, version: usize) -> bool {
    let mut slot = state.round().lock().await;
    let Some(round) = slot.as_mut().filter(|round| round.is_live(id, version)) else {
        return false;
    };

    match round.session.tick() {
        Ok(RoundStep::Ticked { time_left }) => {
            drop(slot);
            broadcast_round_tick(state, id, time_left);
            true
        }
        Ok(RoundStep::Answered {
            index,
            outcome: AnswerOutcome::TimedOut,
            ..
        }) => {
            debug!(round_id = %id, index, "question timed out");
            round.ticker.take();
            schedule_auto_advance(state, round);
            let view = round.view();
            drop(slot);
            broadcast_round_tick(state, id, 0);
            broadcast_round_phase(state, &view);
            false
        }
        Ok(_) => false,
        Err(err) => {
            debug!(round_id = %id, error = %err, "tick ignored");
            false
        }
    }
}

fn schedule_auto_advance(state: &SharedState, round: &mut ActiveRound) {
    round.stop_auto_advance();
    let (id, version) = (round.id, round.session.version());
    let state = state.clone();

    round.auto_advance = Some(tokio::spawn(async move {
        time::sleep(AUTO_ADVANCE_DELAY).await;

        let mut slot = state.round().lock().await;
        let Some(round) = slot.as_mut().filter(|round| round.is_live(id, version)) else {
            return;
        };
        round.auto_advance.take();
        let step = match round.session.advance() {
            Ok(step) => step,
            Err(err) => {
                warn!(round_id = %id, error = %err, "auto-advance rejected");
                return;
            }
        };

        let completed = after_advance(&state, round, step);
        let view = round.view();
        drop(slot);

        broadcast_round_phase(&state, &view);
        if let Some(completed) = completed {
            complete_round(&state, completed).await;
        }
    }));
}

fn after_advance(
    state: &SharedState,
    round: &mut ActiveRound,
    step: RoundStep,
) -> Option<CompletedRound> {
    match step {
        RoundStep::Presenting { index } => {
            debug!(round_id = %round.id, index, "next question");
            spawn_ticker(state, round);
            None
        }
        RoundStep::Finished { .. } => {
            let score = round.session.take_final_score()?;
            Some(CompletedRound {
                id: round.id,
                player: round.player.clone(),
                config: round.session.config().clone(),
                score,
                duration: elapsed_seconds(round.started_at),
            })
        }
        _ => None,
    }
}

fn elapsed_seconds(started_at: Instant) -> u64 {
    started_at.elapsed().as_secs_f64().round() as u64
}

async fn complete_round(state: &SharedState, completed: CompletedRound) {
    let CompletedRound {
        id,
        player,
        config,
        score,
        duration,
    } = completed;
    let now = state.clock().now();

    info!(round_id = %id, player = %player, score, duration, "round finished");
    state
        .persistent()
        .append_score(ScoreRecord {
            name: player.clone(),
            score,
            date: format_timestamp(now),
            juz: config.juz().to_vec(),
            difficulty: config.difficulty(),
            number_of_questions: config.question_count(),
            game_mode: config.mode(),
            duration: Some(duration),
        })
        .await;

    if config.mode().is_daily() {
        state
            .persistent()
            .mark_daily_completed(&player, state.clock().today())
            .await;
    }

    if let Err(err) =
        run_transition_with_broadcast(state, ScreenEvent::RoundFinished, || async { Ok(()) }).await
    {
        warn!(round_id = %id, error = %err, "round finished but the finished screen was not shown");
    }

    let global_rank = state
        .persistent()
        .with_scores(|history| rank_of(&global_ranking(history), &player))
        .await;
    broadcast_round_finished(
        state,
        &RoundFinishedEvent {
            round_id: id,
            player,
            score,
            duration,
            mode: config.mode(),
            global_rank,
        },
    );
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex as StdMutex},
    };

    use futures::future::BoxFuture;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        dao::slot_store::{MemorySlotStore, Slot},
        dto::round::VisibleRoundPhase,
        services::{
            daily::DAILY_QUESTION_COUNT,
            player_service,
            question_source::{QuestionRequest, QuestionSource, QuestionSourceError},
        },
        state::{
            game::{Difficulty, GameMode},
            round::{POINTS_PER_CORRECT, QUESTION_TIME_LIMIT},
            screen::Screen,
            test_support::state_with,
        },
    };

    fn questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| Question {
                question_text: format!("Lanjutkan ayat berikut: {i}"),
                options: vec![
                    format!("salah a {i}"),
                    format!("benar {i}"),
                    format!("salah b {i}"),
                    format!("salah c {i}"),
                ],
                correct_answer: format!("benar {i}"),
                reference: format!("Al-Mulk: {}", i + 1),
            })
            .collect()
    }

    #[derive(Default)]
    struct ScriptedSource {
        replies: StdMutex<VecDeque<QuestionSourceResult<Vec<Question>>>>,
        requests: StdMutex<Vec<QuestionRequest>>,
        credentials: StdMutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn replying(replies: Vec<QuestionSourceResult<Vec<Question>>>) -> Self {
            Self {
                replies: StdMutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    impl QuestionSource for ScriptedSource {
        fn fetch(
            &self,
            request: QuestionRequest,
        ) -> BoxFuture<'static, QuestionSourceResult<Vec<Question>>> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(QuestionSourceError::Failed("no scripted reply".into())));
            let gate = self.gate.clone();
            Box::pin(async move {
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                reply
            })
        }

        fn set_credential(&self, credential: String) {
            self.credentials.lock().unwrap().push(credential);
        }
    }

    fn manual(mode: GameMode, count: u32) -> StartRoundRequest {
        StartRoundRequest {
            mode,
            juz: vec![29],
            difficulty: Some(Difficulty::Easy),
            question_count: Some(count),
        }
    }

    fn daily() -> StartRoundRequest {
        StartRoundRequest {
            mode: GameMode::DailyChallenge,
            juz: Vec::new(),
            difficulty: None,
            question_count: None,
        }
    }

    async fn settle_until<F>(state: &SharedState, mut done: F) -> RoundView
    where
        F: FnMut(&RoundView) -> bool,
    {
        for _ in 0..100 {
            if let Ok(view) = current_round(state).await {
                if done(&view) {
                    return view;
                }
            }
            tokio::task::yield_now().await;
        }
        panic!("round did not reach the expected phase");
    }

    async fn presenting(state: &SharedState) -> RoundView {
        settle_until(state, |view| view.phase == VisibleRoundPhase::Presenting).await
    }

    async fn answer_current(state: &SharedState, correctly: bool) {
        let view = presenting(state).await;
        let question = view.question.unwrap();
        let choice = question
            .options
            .into_iter()
            .find(|option| option.starts_with("benar") == correctly)
            .unwrap();
        select_option(state, choice).await.unwrap();
        submit_answer(state).await.unwrap();
        next_question(state).await.unwrap();
    }

    async fn setup(
        store: MemorySlotStore,
        source: ScriptedSource,
        name: &str,
    ) -> (SharedState, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let (state, _clock) = state_with(store, source.clone()).await;
        player_service::enter_name(&state, name).await.unwrap();
        (state, source)
    }

    #[tokio::test(start_paused = true)]
    async fn all_correct_answers_record_one_hundred() {
        let store = MemorySlotStore::new();
        let (state, _source) = setup(
            store.clone(),
            ScriptedSource::replying(vec![Ok(questions(5))]),
            "Ali",
        )
        .await;

        let view = start_round(&state, manual(GameMode::MultipleChoice, 5))
            .await
            .unwrap();
        assert_eq!(view.phase, VisibleRoundPhase::Loading);
        assert_eq!(state.screen().await, Screen::Playing);

        for _ in 0..5 {
            answer_current(&state, true).await;
        }

        let finished = current_round(&state).await.unwrap();
        assert_eq!(finished.phase, VisibleRoundPhase::Finished);
        assert_eq!(finished.score, 5 * POINTS_PER_CORRECT);
        assert_eq!(state.screen().await, Screen::Finished);

        let history = state.persistent().snapshot().await.scores;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Ali");
        assert_eq!(history[0].score, 100);
        assert_eq!(history[0].number_of_questions, 5);
        assert!(history[0].duration.is_some());
        assert!(store.raw(Slot::Scores).unwrap().contains("\"score\":100"));
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answers_score_nothing_and_reveal_the_answer() {
        let (state, _source) =
            setup(MemorySlotStore::new(), ScriptedSource::replying(vec![Ok(questions(1))]), "Budi")
                .await;
        start_round(&state, manual(GameMode::MultipleChoice, 1))
            .await
            .unwrap();

        presenting(&state).await;
        select_option(&state, "salah a 0".into()).await.unwrap();
        let revealed = submit_answer(&state).await.unwrap();
        assert_eq!(revealed.phase, VisibleRoundPhase::Submitted);
        assert_eq!(revealed.correct_answer.as_deref(), Some("benar 0"));
        assert_eq!(revealed.score, 0);

        next_question(&state).await.unwrap();
        let history = state.persistent().snapshot().await.scores;
        assert_eq!(history[0].score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_questions_time_out_and_auto_advance() {
        let (state, _source) =
            setup(MemorySlotStore::new(), ScriptedSource::replying(vec![Ok(questions(2))]), "Citra")
                .await;
        start_round(&state, manual(GameMode::GuessSurah, 2))
            .await
            .unwrap();
        presenting(&state).await;

        time::sleep(Duration::from_secs(u64::from(QUESTION_TIME_LIMIT)) + TICK_PERIOD / 2).await;
        let timed_out = current_round(&state).await.unwrap();
        assert_eq!(timed_out.phase, VisibleRoundPhase::Submitted);
        assert_eq!(timed_out.question.as_ref().unwrap().index, 0);
        assert_eq!(timed_out.correct_answer.as_deref(), Some("benar 0"));

        time::sleep(AUTO_ADVANCE_DELAY).await;
        let second = current_round(&state).await.unwrap();
        assert_eq!(second.phase, VisibleRoundPhase::Presenting);
        assert_eq!(second.question.as_ref().unwrap().index, 1);
        assert_eq!(second.time_left, QUESTION_TIME_LIMIT);

        time::sleep(Duration::from_secs(u64::from(QUESTION_TIME_LIMIT)) + AUTO_ADVANCE_DELAY * 2)
            .await;
        let finished = current_round(&state).await.unwrap();
        assert_eq!(finished.phase, VisibleRoundPhase::Finished);
        assert_eq!(finished.score, 0);
        assert_eq!(state.screen().await, Screen::Finished);

        let history = state.persistent().snapshot().await.scores;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 0);
        assert_eq!(history[0].game_mode, GameMode::GuessSurah);
        assert!(history[0].duration.unwrap() >= 64);
    }

    #[tokio::test(start_paused = true)]
    async fn submitting_stops_the_countdown() {
        let (state, _source) =
            setup(MemorySlotStore::new(), ScriptedSource::replying(vec![Ok(questions(2))]), "Dewi")
                .await;
        start_round(&state, manual(GameMode::FillBlank, 2))
            .await
            .unwrap();
        presenting(&state).await;

        select_option(&state, "benar 0".into()).await.unwrap();
        submit_answer(&state).await.unwrap();
        time::sleep(Duration::from_secs(120)).await;

        let view = current_round(&state).await.unwrap();
        assert_eq!(view.phase, VisibleRoundPhase::Submitted);
        assert_eq!(view.question.unwrap().index, 0);
        assert_eq!(view.score, POINTS_PER_CORRECT);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_challenge_is_playable_once_per_day() {
        let store = MemorySlotStore::new();
        let (state, source) = setup(
            store.clone(),
            ScriptedSource::replying(vec![
                Ok(questions(DAILY_QUESTION_COUNT as usize)),
                Ok(questions(DAILY_QUESTION_COUNT as usize)),
            ]),
            "Ali",
        )
        .await;

        let view = start_round(&state, daily()).await.unwrap();
        assert_eq!(view.mode, GameMode::DailyChallenge);
        for _ in 0..DAILY_QUESTION_COUNT {
            answer_current(&state, true).await;
        }
        assert_eq!(state.screen().await, Screen::Finished);
        assert!(store.raw(Slot::DailyCompletions).unwrap().contains("2026-10-19"));

        let request = source.requests.lock().unwrap()[0].clone();
        assert_eq!(request.mode, GameMode::GuessSurah);
        assert_eq!(request.question_count, DAILY_QUESTION_COUNT);

        crate::services::navigation_service::navigate(&state, ScreenEvent::PlayAgain)
            .await
            .unwrap();
        let err = start_round(&state, daily()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(message) if message == DAILY_ALREADY_COMPLETED));
        assert_eq!(state.screen().await, Screen::Setup);
        assert!(current_round(&state).await.is_err());

        crate::services::navigation_service::navigate(&state, ScreenEvent::BackToWelcome)
            .await
            .unwrap();
        player_service::enter_name(&state, "Budi").await.unwrap();
        assert!(start_round(&state, daily()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn daily_challenge_reopens_on_the_next_day() {
        let count = DAILY_QUESTION_COUNT as usize;
        let source = Arc::new(ScriptedSource::replying(vec![
            Ok(questions(count)),
            Ok(questions(count)),
        ]));
        let (state, clock) = state_with(MemorySlotStore::new(), source.clone()).await;
        player_service::enter_name(&state, "Ali").await.unwrap();

        start_round(&state, daily()).await.unwrap();
        for _ in 0..DAILY_QUESTION_COUNT {
            answer_current(&state, true).await;
        }
        crate::services::navigation_service::navigate(&state, ScreenEvent::PlayAgain)
            .await
            .unwrap();
        assert!(start_round(&state, daily()).await.is_err());

        clock.set(::time::macros::datetime!(2026-10-20 00:05 +07:00));
        let view = start_round(&state, daily()).await.unwrap();
        assert_eq!(view.mode, GameMode::DailyChallenge);
        assert_eq!(state.screen().await, Screen::Playing);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].daily_seed, requests[1].daily_seed);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_credential_is_retried_after_reauthorizing() {
        let (state, source) = setup(
            MemorySlotStore::new(),
            ScriptedSource::replying(vec![
                Err(QuestionSourceError::Unauthorized(PERMISSION_DENIED_MESSAGE.into())),
                Ok(questions(3)),
            ]),
            "Fatimah",
        )
        .await;
        start_round(&state, manual(GameMode::MultipleChoice, 3))
            .await
            .unwrap();

        let failed = settle_until(&state, |view| view.phase == VisibleRoundPhase::Failed).await;
        let failure = failed.failure.unwrap();
        assert!(failure.requires_api_key);
        assert_eq!(failure.message, PERMISSION_DENIED_MESSAGE);

        let restarted = reauthorize(&state, " new-key ".into()).await.unwrap().unwrap();
        assert_eq!(restarted.phase, VisibleRoundPhase::Loading);
        assert_eq!(source.credentials.lock().unwrap().as_slice(), ["new-key"]);

        let view = presenting(&state).await;
        assert_eq!(view.question_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn generic_failure_waits_for_manual_retry() {
        let (state, _source) = setup(
            MemorySlotStore::new(),
            ScriptedSource::replying(vec![Ok(Vec::new()), Ok(questions(1))]),
            "Hasan",
        )
        .await;
        start_round(&state, manual(GameMode::MultipleChoice, 1))
            .await
            .unwrap();

        let failed = settle_until(&state, |view| view.phase == VisibleRoundPhase::Failed).await;
        assert!(!failed.failure.unwrap().requires_api_key);
        assert!(reauthorize(&state, "key".into()).await.unwrap().is_none());

        retry_round(&state).await.unwrap();
        presenting(&state).await;
    }

    #[tokio::test(start_paused = true)]
    async fn abandoning_discards_the_pending_fetch() {
        let gate = Arc::new(Notify::new());
        let (state, _source) = setup(
            MemorySlotStore::new(),
            ScriptedSource::replying(vec![Ok(questions(2))]).gated(gate.clone()),
            "Ibrahim",
        )
        .await;
        start_round(&state, manual(GameMode::MultipleChoice, 2))
            .await
            .unwrap();

        abandon_round(&state).await.unwrap();
        assert_eq!(state.screen().await, Screen::Setup);

        gate.notify_waiters();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(current_round(&state).await.is_err());
        assert!(state.persistent().snapshot().await.scores.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn batch_for_another_round_is_ignored() {
        let gate = Arc::new(Notify::new());
        let (state, _source) = setup(
            MemorySlotStore::new(),
            ScriptedSource::replying(vec![Ok(questions(2))]).gated(gate),
            "Khadijah",
        )
        .await;
        let view = start_round(&state, manual(GameMode::MultipleChoice, 2))
            .await
            .unwrap();

        on_questions_loaded(&state, Uuid::new_v4(), 0, Ok(questions(2))).await;
        on_questions_loaded(&state, view.round_id, 7, Ok(questions(2))).await;
        assert_eq!(
            current_round(&state).await.unwrap().phase,
            VisibleRoundPhase::Loading
        );

        on_questions_loaded(&state, view.round_id, 0, Ok(questions(2))).await;
        assert_eq!(
            current_round(&state).await.unwrap().phase,
            VisibleRoundPhase::Presenting
        );
    }

    #[tokio::test]
    async fn starting_requires_a_player_and_valid_config() {
        let source = Arc::new(ScriptedSource::default());
        let (state, _clock) = state_with(MemorySlotStore::new(), source).await;
        let err = start_round(&state, manual(GameMode::MultipleChoice, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        player_service::enter_name(&state, "Umar").await.unwrap();
        let mut request = manual(GameMode::MultipleChoice, 5);
        request.juz = vec![0];
        let err = start_round(&state, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(state.screen().await, Screen::Setup);
    }
}
