// Accessor generator.
//
// The emitted sequence touches nothing but host facilities: a one-slot
// container, the well-known channel, and a checked cast. It publishes the
// unit id under the runtime key and reads back whatever the interceptor put
// into slot 0.

use super::builder::RoutineBuilder;
use super::insn::Shape;
use crate::error::GenerateError;
use crate::Channel::host::Host;
use crate::Core::store::UnitId;
use tracing::debug;

/// Peak operand stack depth of the sequence emitted by
/// [`generate_data_accessor`]: container, container, index, id.
pub const ACCESSOR_MAX_STACK: usize = 4;

/// Append to `gen` the code that hands `unit_id`'s record to the caller.
///
/// On return the record, narrowed to [`Shape::Probes`], is on top of the
/// operand stack. The caller decides what follows (usually `ret()` or a store
/// into the unit's own field).
///
/// Returns the peak stack depth the emitted code adds above the depth `gen`
/// had on entry.
pub fn generate_data_accessor(
    unit_id: UnitId,
    key: &str,
    channel: &str,
    host: &Host,
    gen: &mut RoutineBuilder,
) -> Result<usize, GenerateError> {
    if !host.provides_channels() {
        return Err(GenerateError::ChannelUnavailable {
            host: host.name().to_string(),
        });
    }

    let mark = gen.open_span();

    // 1. Parameter container holding the boxed id

    gen.push_int(1).new_array();
    gen.dup().push_int(0).push_long(unit_id).box_long();
    gen.array_store();

    let params = gen.new_local();
    gen.store_local(params);

    // 2. Publish on the channel

    gen.get_channel(channel).push_str(key).load_local(params);
    gen.publish();

    // 3. Read the record back out of slot 0

    gen.load_local(params).push_int(0).array_load();
    gen.check_cast(Shape::Probes);

    let peak = gen.close_span(mark);
    debug_assert_eq!(peak, ACCESSOR_MAX_STACK);
    debug!(unit_id, channel, max_stack = peak, "generated data accessor");
    Ok(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Accessor::insn::Insn;

    #[test]
    fn id_is_embedded_as_constant() {
        let host = Host::new("test");
        let mut gen = RoutineBuilder::new();
        generate_data_accessor(0x2A, "k", "c", &host, &mut gen).unwrap();
        gen.ret();

        let routine = gen.finish();
        assert!(routine.code().contains(&Insn::PushLong(0x2A)));
        assert_eq!(
            routine
                .code()
                .iter()
                .filter(|i| **i == Insn::Publish)
                .count(),
            1
        );
        assert_eq!(
            routine
                .code()
                .iter()
                .filter(|i| **i == Insn::NewArray)
                .count(),
            1
        );
        assert_eq!(routine.max_locals(), 1);
    }

    #[test]
    fn reports_bound_relative_to_entry_depth() {
        let host = Host::new("test");
        let mut gen = RoutineBuilder::new();
        gen.push_int(0).push_int(0);

        let needed = generate_data_accessor(1, "k", "c", &host, &mut gen).unwrap();

        assert_eq!(needed, ACCESSOR_MAX_STACK);
        assert_eq!(gen.max_stack(), 2 + ACCESSOR_MAX_STACK);
        assert_eq!(gen.depth(), 3);
    }

    #[test]
    fn enclosing_span_survives_generation() {
        let host = Host::new("test");
        let mut gen = RoutineBuilder::new();
        let outer = gen.open_span();
        for n in 0..10 {
            gen.push_int(n);
        }
        for _ in 0..10 {
            let slot = gen.new_local();
            gen.store_local(slot);
        }

        let needed = generate_data_accessor(1, "k", "c", &host, &mut gen).unwrap();

        assert_eq!(needed, ACCESSOR_MAX_STACK);
        assert_eq!(gen.span_peak(outer), 10);
        assert_eq!(gen.max_stack(), 10);
    }

    #[test]
    fn bare_host_fails_generation_and_emits_nothing() {
        let host = Host::without_channels("bare");
        let mut gen = RoutineBuilder::new();

        let err = generate_data_accessor(1, "k", "c", &host, &mut gen).unwrap_err();

        assert_eq!(
            err,
            GenerateError::ChannelUnavailable {
                host: "bare".to_string()
            }
        );
        assert!(gen.is_empty());
    }
}
