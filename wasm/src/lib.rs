use minesweeper_agent as ms;
use ms::Agent;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_field(width: u8, height: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let field = ms::MineField::random(width as usize, height as usize, mines as usize)
        .map_err(|e| e.to_string())?;
    field.to_bytes().map_err(|e| e.to_string())
}

/// Lets the agent play the field. Returns the played field followed by the
/// outcome: 0 won, 1 lost, 2 stuck.
#[wasm_bindgen]
pub fn play_field(bts: Vec<u8>, trace: bool) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let field = ms::MineField::from_bytes(&bts).map_err(|e| e.to_string())?;
    let mut agent = ms::Orchestrator::new(field, &ms::AgentConfig::default());
    agent.set_trace(trace);
    let outcome = agent.solve().map_err(|e| e.to_string())?;

    let mut xs = agent.into_board().to_bytes().map_err(|e| e.to_string())?;
    xs.push(match outcome {
        ms::Outcome::Won => 0,
        ms::Outcome::Lost => 1,
        ms::Outcome::Stuck => 2,
    });
    Ok(xs)
}

/// The visible board, row-major: -1 hidden, -2 revealed mine, else the count.
#[wasm_bindgen]
pub fn field_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let field = ms::MineField::from_bytes(&bts).map_err(|e| e.to_string())?;
    Ok((0..field.height)
        .flat_map(|y| (0..field.width).map(move |x| ms::Position::new(x, y)))
        .map(|pos| match field.visible(pos) {
            None => -1,
            Some(ms::RevealResult::Mine) => -2,
            Some(ms::RevealResult::Count(n)) => n as i8,
        })
        .collect())
}
