use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, MouseEvent};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Bounded event queue capacity; bursty input is buffered, ticks are
/// coalesced when the queue is full.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Tick,
    Resize,
}

/// Multiplexes terminal input and a fixed-rate tick onto one channel.
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self::from_stream(EventStream::new(), tick_rate)
    }

    /// Build an EventHandler from any crossterm-compatible event stream.
    /// Production uses `EventStream::new()`; tests inject a fake stream.
    pub fn from_stream<S>(stream: S, tick_rate: Duration) -> Self
    where
        S: Stream<Item = Result<CrosstermEvent, std::io::Error>> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            let mut reader = stream;
            let mut tick = tokio::time::interval(tick_rate);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        match tx.try_send(Event::Tick) {
                            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                            Err(mpsc::error::TrySendError::Closed(_)) => break,
                        }
                    }
                    event = reader.next() => {
                        let mapped = match event {
                            Some(Ok(CrosstermEvent::Key(key))) => Some(Event::Key(key)),
                            Some(Ok(CrosstermEvent::Mouse(mouse))) => Some(Event::Mouse(mouse)),
                            Some(Ok(CrosstermEvent::Resize(_, _))) => Some(Event::Resize),
                            Some(Ok(_)) => None,
                            Some(Err(_)) | None => break,
                        };
                        if let Some(mapped) = mapped {
                            if tx.send(mapped).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEventKind};

    fn fake_stream(
        events: Vec<Result<CrosstermEvent, std::io::Error>>,
    ) -> impl Stream<Item = Result<CrosstermEvent, std::io::Error>> + Send + Unpin {
        futures::stream::iter(events)
    }

    fn key_event(code: KeyCode) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn forwards_key_mouse_and_resize() {
        let stream = fake_stream(vec![
            Ok(key_event(KeyCode::Char('q'))),
            Ok(CrosstermEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 7,
                row: 3,
                modifiers: KeyModifiers::NONE,
            })),
            Ok(CrosstermEvent::Resize(100, 30)),
        ]);
        let mut handler = EventHandler::from_stream(stream, Duration::from_secs(60));

        assert!(matches!(
            handler.next().await.unwrap(),
            Event::Key(k) if k.code == KeyCode::Char('q')
        ));
        assert!(matches!(
            handler.next().await.unwrap(),
            Event::Mouse(m) if m.column == 7 && m.row == 3
        ));
        assert!(matches!(handler.next().await.unwrap(), Event::Resize));
    }

    #[tokio::test]
    async fn tick_fires_without_input() {
        let stream = futures::stream::pending();
        let mut handler = EventHandler::from_stream(stream, Duration::from_millis(5));
        assert!(matches!(handler.next().await.unwrap(), Event::Tick));
    }

    #[tokio::test]
    async fn unknown_crossterm_events_are_skipped() {
        let stream = fake_stream(vec![
            Ok(CrosstermEvent::FocusGained),
            Ok(key_event(KeyCode::Enter)),
        ]);
        let mut handler = EventHandler::from_stream(stream, Duration::from_secs(60));
        assert!(matches!(
            handler.next().await.unwrap(),
            Event::Key(k) if k.code == KeyCode::Enter
        ));
    }

    #[tokio::test]
    async fn stream_end_closes_channel() {
        let stream = fake_stream(vec![Ok(key_event(KeyCode::Char('a')))]);
        let mut handler = EventHandler::from_stream(stream, Duration::from_secs(60));
        assert!(matches!(handler.next().await.unwrap(), Event::Key(_)));
        loop {
            match handler.next().await {
                Some(Event::Tick) => continue,
                None => break,
                other => panic!("expected channel close, got {other:?}"),
            }
        }
    }
}
