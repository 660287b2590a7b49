use std::time::{Duration, Instant};

use crossterm::event::{self, Event, MouseEventKind};
use ratatui::{backend::Backend, Terminal};

use crate::{app::App, ui};

const WHEEL_STEP: u16 = 3;

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut last_draw = Instant::now();
    let heartbeat = Duration::from_millis(500);
    loop {
        if app.dirty || last_draw.elapsed() >= heartbeat {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
            last_draw = Instant::now();
        }
        if app.show_help {
            let _ = terminal.hide_cursor();
        } else {
            let _ = terminal.show_cursor();
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Paste(s) => app.insert_text(&s),
                Event::Resize(_, _) => app.dirty = true,
                Event::Mouse(me) => {
                    let inside = app.chat_area.is_some_and(|area| {
                        me.column >= area.x
                            && me.column < area.x + area.width
                            && me.row >= area.y
                            && me.row < area.y + area.height
                    });
                    if inside && !app.show_help && app.model_picker.is_none() {
                        match me.kind {
                            MouseEventKind::ScrollUp => {
                                app.scroll_up(WHEEL_STEP);
                                app.dirty = true;
                            }
                            MouseEventKind::ScrollDown => {
                                app.scroll_down(WHEEL_STEP);
                                app.dirty = true;
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        app.on_tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
