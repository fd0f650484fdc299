// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus server implementation for the simulated chiller
//!
//! For avoiding confusion with the Modbus master/slave terminology, this module uses
//! the terms "server" and "client" instead. The server is the device that provides data,
//! while the client is the device that requests data.
//!
//! The server holds no register data of its own: every request is answered
//! from the shared [`RegisterState`] that the simulation engine refreshes.

use std::{future, sync::Arc};

use log::{debug, error, warn};
use tokio_modbus::prelude::*;

use crate::error::RegisterError;
use crate::register_state::RegisterState;
use crate::registry::Block;

/// Largest register count of a read request (function codes 0x03, 0x04, 0x17).
pub const MAX_READ_REGISTERS: u16 = 125;
/// Largest register count of a write request (function codes 0x10, 0x17).
pub const MAX_WRITE_REGISTERS: u16 = 123;
/// Largest bit count of a read request (function codes 0x01, 0x02).
pub const MAX_READ_BITS: u16 = 2000;
/// Largest bit count of a write request (function code 0x0F).
pub const MAX_WRITE_BITS: u16 = 1968;

/// Broadcast unit id. Writes are applied, nothing is answered.
const BROADCAST_UNIT_ID: u8 = 0;

/// A Modbus TCP service exposing the four register banks of the chiller.
///
/// ### Function codes
///
/// | Code | Request | Bank |
/// |------|---------|------|
/// | 0x01 | Read Coils | coils |
/// | 0x02 | Read Discrete Inputs | discrete inputs |
/// | 0x03 | Read Holding Registers | holding registers |
/// | 0x04 | Read Input Registers | input registers |
/// | 0x05 | Write Single Coil | coils |
/// | 0x06 | Write Single Register | holding registers |
/// | 0x0F | Write Multiple Coils | coils |
/// | 0x10 | Write Multiple Registers | holding registers |
/// | 0x17 | Read/Write Multiple Registers | holding registers |
///
/// Any other function code is answered with `IllegalFunction`.
///
/// ### Unit id
///
/// Without `strict_unit_id` every unit id is answered. With it, requests for
/// another unit are dropped silently, which is what a gateway does for a
/// device that is not on its bus.
#[derive(Clone)]
pub struct ChillerModbusServer {
    state: Arc<RegisterState>,
    unit_id: u8,
    strict_unit_id: bool,
}

impl tokio_modbus::server::Service for ChillerModbusServer {
    type Request = SlaveRequest<'static>;
    type Response = Option<Response>;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        let SlaveRequest { slave, request } = req;
        debug!("Received Modbus request for unit {}: {:?}", slave, request);

        let broadcast = slave == BROADCAST_UNIT_ID;
        if self.strict_unit_id && slave != self.unit_id && !(broadcast && is_write(&request)) {
            debug!(
                "Ignoring request for unit {} (serving unit {})",
                slave, self.unit_id
            );
            return future::ready(Ok(None));
        }

        let res = self.handle(request);

        if let Err(e) = &res {
            error!("Modbus request error: {:?}", e);
        }

        // Broadcast writes are never answered
        if self.strict_unit_id && broadcast {
            return future::ready(Ok(None));
        }
        future::ready(res.map(Some))
    }
}

impl ChillerModbusServer {
    /// Create a server answering every unit id.
    pub fn new(state: Arc<RegisterState>) -> Self {
        let unit_id = state.unit_id();
        Self {
            state,
            unit_id,
            strict_unit_id: false,
        }
    }

    /// Only answer requests addressed to the unit id of the register state.
    pub fn with_strict_unit_id(mut self, strict: bool) -> Self {
        self.strict_unit_id = strict;
        self
    }

    /// Unit id this server identifies as.
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Shared register banks.
    pub fn state(&self) -> &Arc<RegisterState> {
        &self.state
    }

    fn handle(&self, request: Request<'static>) -> Result<Response, ExceptionCode> {
        match request {
            Request::ReadCoils(addr, cnt) => {
                debug!("Reading {} coils starting from address {}", cnt, addr);
                check_quantity(cnt, MAX_READ_BITS)?;
                self.bits_read(Block::Coil, addr, cnt)
                    .map(Response::ReadCoils)
            }
            Request::ReadDiscreteInputs(addr, cnt) => {
                debug!(
                    "Reading {} discrete inputs starting from address {}",
                    cnt, addr
                );
                check_quantity(cnt, MAX_READ_BITS)?;
                self.bits_read(Block::DiscreteInput, addr, cnt)
                    .map(Response::ReadDiscreteInputs)
            }
            Request::ReadHoldingRegisters(addr, cnt) => {
                debug!(
                    "Reading {} holding registers starting from address {}",
                    cnt, addr
                );
                check_quantity(cnt, MAX_READ_REGISTERS)?;
                self.register_read(Block::HoldingRegister, addr, cnt)
                    .map(Response::ReadHoldingRegisters)
            }
            Request::ReadInputRegisters(addr, cnt) => {
                debug!(
                    "Reading {} input registers starting from address {}",
                    cnt, addr
                );
                check_quantity(cnt, MAX_READ_REGISTERS)?;
                self.register_read(Block::InputRegister, addr, cnt)
                    .map(Response::ReadInputRegisters)
            }
            Request::WriteSingleCoil(addr, value) => {
                debug!("Writing value {} to coil {}", value, addr);
                self.bits_write(Block::Coil, addr, std::slice::from_ref(&value))
                    .map(|_| Response::WriteSingleCoil(addr, value))
            }
            Request::WriteMultipleCoils(addr, values) => {
                debug!(
                    "Writing {} values to coils starting from address {}",
                    values.len(),
                    addr
                );
                check_quantity(quantity_of(values.len())?, MAX_WRITE_BITS)?;
                self.bits_write(Block::Coil, addr, &values)
                    .map(|_| Response::WriteMultipleCoils(addr, values.len() as u16))
            }
            Request::WriteSingleRegister(addr, value) => {
                debug!("Writing value {} to holding register {}", value, addr);
                self.register_write(Block::HoldingRegister, addr, std::slice::from_ref(&value))
                    .map(|_| Response::WriteSingleRegister(addr, value))
            }
            Request::WriteMultipleRegisters(addr, values) => {
                debug!(
                    "Writing {} values to holding registers starting from address {}",
                    values.len(),
                    addr
                );
                check_quantity(quantity_of(values.len())?, MAX_WRITE_REGISTERS)?;
                self.register_write(Block::HoldingRegister, addr, &values)
                    .map(|_| Response::WriteMultipleRegisters(addr, values.len() as u16))
            }
            Request::ReadWriteMultipleRegisters(read_addr, cnt, write_addr, values) => {
                debug!(
                    "Writing {} holding registers at {} then reading {} at {}",
                    values.len(),
                    write_addr,
                    cnt,
                    read_addr
                );
                check_quantity(cnt, MAX_READ_REGISTERS)?;
                check_quantity(quantity_of(values.len())?, MAX_WRITE_REGISTERS)?;
                // The write is performed before the read
                self.register_write(Block::HoldingRegister, write_addr, &values)?;
                self.register_read(Block::HoldingRegister, read_addr, cnt)
                    .map(Response::ReadWriteMultipleRegisters)
            }
            _ => {
                warn!(
                    "Exception::IllegalFunction - Unimplemented function code in request: {request:?}"
                );
                Err(ExceptionCode::IllegalFunction)
            }
        }
    }

    fn register_read(&self, block: Block, addr: u16, cnt: u16) -> Result<Vec<u16>, ExceptionCode> {
        self.state.read(block, addr, cnt).map_err(to_exception)
    }

    fn register_write(&self, block: Block, addr: u16, values: &[u16]) -> Result<(), ExceptionCode> {
        self.state.write(block, addr, values).map_err(to_exception)
    }

    fn bits_read(&self, block: Block, addr: u16, cnt: u16) -> Result<Vec<bool>, ExceptionCode> {
        self.state.read_bits(block, addr, cnt).map_err(to_exception)
    }

    fn bits_write(&self, block: Block, addr: u16, values: &[bool]) -> Result<(), ExceptionCode> {
        self.state.write_bits(block, addr, values).map_err(to_exception)
    }
}

fn is_write(request: &Request<'_>) -> bool {
    matches!(
        request,
        Request::WriteSingleCoil(..)
            | Request::WriteMultipleCoils(..)
            | Request::WriteSingleRegister(..)
            | Request::WriteMultipleRegisters(..)
    )
}

fn quantity_of(len: usize) -> Result<u16, ExceptionCode> {
    u16::try_from(len).map_err(|_| ExceptionCode::IllegalDataValue)
}

fn check_quantity(cnt: u16, max: u16) -> Result<(), ExceptionCode> {
    if cnt == 0 || cnt > max {
        debug!("Exception::IllegalDataValue - quantity {} not in 1..={}", cnt, max);
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok(())
}

fn to_exception(err: RegisterError) -> ExceptionCode {
    match err {
        RegisterError::OutOfRange { .. } => {
            debug!("Exception::IllegalDataAddress - {}", err);
            ExceptionCode::IllegalDataAddress
        }
        RegisterError::Unavailable { .. } => {
            error!("Exception::ServerDeviceFailure - {}", err);
            ExceptionCode::ServerDeviceFailure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tokio_modbus::server::Service;

    fn server() -> ChillerModbusServer {
        ChillerModbusServer::new(Arc::new(RegisterState::with_sizes(255, 1, 4, 10, 10)))
    }

    async fn call(
        server: &ChillerModbusServer,
        slave: u8,
        request: Request<'static>,
    ) -> Result<Option<Response>, ExceptionCode> {
        server.call(SlaveRequest { slave, request }).await
    }

    #[tokio::test]
    async fn test_read_input_registers() {
        let server = server();
        server
            .state()
            .write(Block::InputRegister, 3, &[0x41CC, 0x0000])
            .unwrap();

        let response = call(&server, 1, Request::ReadInputRegisters(3, 2)).await;
        assert_eq!(
            response,
            Ok(Some(Response::ReadInputRegisters(vec![0x41CC, 0x0000])))
        );
    }

    #[tokio::test]
    async fn test_write_then_read_holding_registers() {
        let server = server();
        let response = call(
            &server,
            255,
            Request::WriteMultipleRegisters(4, Cow::Owned(vec![1, 2, 3])),
        )
        .await;
        assert_eq!(response, Ok(Some(Response::WriteMultipleRegisters(4, 3))));

        let response = call(&server, 255, Request::ReadHoldingRegisters(4, 3)).await;
        assert_eq!(
            response,
            Ok(Some(Response::ReadHoldingRegisters(vec![1, 2, 3])))
        );
    }

    #[tokio::test]
    async fn test_coils() {
        let server = server();
        let response = call(&server, 1, Request::WriteSingleCoil(2, true)).await;
        assert_eq!(response, Ok(Some(Response::WriteSingleCoil(2, true))));

        let response = call(&server, 1, Request::ReadCoils(0, 4)).await;
        assert_eq!(
            response,
            Ok(Some(Response::ReadCoils(vec![false, false, true, false])))
        );
    }

    #[tokio::test]
    async fn test_read_write_multiple_registers() {
        let server = server();
        let response = call(
            &server,
            1,
            Request::ReadWriteMultipleRegisters(0, 3, 1, Cow::Owned(vec![7, 8])),
        )
        .await;
        assert_eq!(
            response,
            Ok(Some(Response::ReadWriteMultipleRegisters(vec![0, 7, 8])))
        );
    }

    #[tokio::test]
    async fn test_out_of_range_is_illegal_address() {
        let server = server();
        let response = call(&server, 1, Request::ReadInputRegisters(9, 2)).await;
        assert_eq!(response, Err(ExceptionCode::IllegalDataAddress));

        // Nothing is written when the range does not fit
        let response = call(
            &server,
            1,
            Request::WriteMultipleRegisters(9, Cow::Owned(vec![1, 1])),
        )
        .await;
        assert_eq!(response, Err(ExceptionCode::IllegalDataAddress));
        assert_eq!(
            server.state().read(Block::HoldingRegister, 9, 1).unwrap(),
            vec![0]
        );
    }

    #[tokio::test]
    async fn test_bad_quantity_is_illegal_value() {
        let server = server();
        let response = call(&server, 1, Request::ReadHoldingRegisters(0, 0)).await;
        assert_eq!(response, Err(ExceptionCode::IllegalDataValue));

        let response = call(&server, 1, Request::ReadHoldingRegisters(0, 126)).await;
        assert_eq!(response, Err(ExceptionCode::IllegalDataValue));
    }

    #[tokio::test]
    async fn test_unsupported_function() {
        let server = server();
        let response = call(&server, 1, Request::MaskWriteRegister(0, 0xFF, 0)).await;
        assert_eq!(response, Err(ExceptionCode::IllegalFunction));
    }

    #[tokio::test]
    async fn test_any_unit_id_answered_by_default() {
        let server = server();
        for slave in [0, 1, 17, 255] {
            let response = call(&server, slave, Request::ReadHoldingRegisters(0, 1)).await;
            assert_eq!(response, Ok(Some(Response::ReadHoldingRegisters(vec![0]))));
        }
    }

    #[tokio::test]
    async fn test_strict_unit_id() {
        let server = server().with_strict_unit_id(true);

        let response = call(&server, 255, Request::ReadHoldingRegisters(0, 1)).await;
        assert_eq!(response, Ok(Some(Response::ReadHoldingRegisters(vec![0]))));

        let response = call(&server, 1, Request::ReadHoldingRegisters(0, 1)).await;
        assert_eq!(response, Ok(None));

        // Broadcast writes are applied without a response
        let response = call(&server, 0, Request::WriteSingleRegister(0, 42)).await;
        assert_eq!(response, Ok(None));
        assert_eq!(
            server.state().read(Block::HoldingRegister, 0, 1).unwrap(),
            vec![42]
        );

        // Broadcast reads are dropped
        let response = call(&server, 0, Request::ReadHoldingRegisters(0, 1)).await;
        assert_eq!(response, Ok(None));
    }
}
