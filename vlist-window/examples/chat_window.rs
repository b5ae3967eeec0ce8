// Example: a bottom-pivoted chat log driven by a frame loop.
//
// The surface here only prints what a real host (DOM, widget tree) would do and lays messages
// out at a fixed height.
use vlist_window::{
    ControllerOptions, Placement, Rect, Sequence, Surface, Transition, WindowController,
};

struct PrintSurface {
    scroll: u64,
    attached: usize,
}

impl Surface<String> for PrintSurface {
    fn attach(&mut self, _element: &String, _placement: Placement<'_, String>) {
        self.attached += 1;
    }

    fn detach(&mut self, _element: &String) {
        self.attached -= 1;
    }

    fn measure(&mut self, element: &String) -> u32 {
        24 + (element.len() as u32 % 4) * 16
    }

    fn translate(&mut self, element: &String, offset: i64, transition: Transition) {
        if offset != 0 {
            println!("  translate {element} by {offset} ({transition:?})");
        }
    }

    fn scroll_offset(&self) -> u64 {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: u64) {
        self.scroll = offset;
    }
}

fn main() -> Result<(), vlist_window::Error> {
    let messages = Sequence::new((0..500u32).collect());
    let options = ControllerOptions::new()
        .with_items(messages.subscribe())
        .with_renderer(|id: &u32| format!("message #{id}"))
        .with_pivot_bottom(true)
        .with_initial_rect(Some(Rect::new(600, 360)))
        .with_on_reach_top(Some(|| println!("  reached the top: load older messages")));
    let surface = PrintSurface {
        scroll: 0,
        attached: 0,
    };
    let mut chat = WindowController::new(options, surface)?;
    chat.tick(0)?;
    println!("initial: {:?}", chat.state());

    // The user scrolls up to the top of what is rendered.
    chat.on_scroll(0)?;
    println!("after scrolling up: {:?}", chat.state());

    // Older history arrives and a new message is appended at the same time.
    let mut next: Vec<u32> = (1000..1050).collect();
    next.extend(0..501);
    messages.set(next);
    chat.pump()?;

    let mut now_ms = 0;
    while chat.is_locked() || chat.is_animating() {
        now_ms += 16;
        chat.tick(now_ms)?;
    }
    println!("after the update: {:?}", chat.state());

    // Jump to an old message that is far outside the window.
    chat.focus(&1010, None)?;
    while chat.is_locked() || chat.is_animating() {
        now_ms += 16;
        chat.tick(now_ms)?;
    }
    println!(
        "after focus: {:?}, {} elements attached",
        chat.state(),
        chat.surface().attached
    );
    Ok(())
}
