use state_machines::state_machine;

state_machine! {
    name: FileMachine,
    state: FileState,
    initial: Ready,
    states: [Ready, Loaded, Streamed, Merged, Masked, Persisted, Failed],
    events {
        load { transition: { from: Ready, to: Loaded } }
        stream { transition: { from: Loaded, to: Streamed } }
        merge { transition: { from: Streamed, to: Merged } }
        mask { transition: { from: Merged, to: Masked } }
        persist { transition: { from: Masked, to: Persisted } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Loaded, to: Failed }
            transition: { from: Streamed, to: Failed }
            transition: { from: Merged, to: Failed }
            transition: { from: Masked, to: Failed }
            transition: { from: Persisted, to: Failed }
        }
    }
}

pub fn ready() -> FileMachine<(), Ready> {
    FileMachine::new(())
}
