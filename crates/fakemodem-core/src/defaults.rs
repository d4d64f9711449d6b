//! Built-in command table of the emulated Celer900 module.
//!
//! Templates are the exact bytes the device sends, final terminator
//! included. Line endings inside a template vary (`\r\n`, `\r`, `\n`) the
//! same way they do on the real firmware, and clients match on them.

/// Command → reply template pairs of the reference device.
pub const REFERENCE_COMMANDS: &[(&str, &str)] = &[
    // Basic
    ("AT", "OK\r\n"),
    ("ATE0", "OK\r\n"),
    ("ATE1", "OK\r\n"),
    ("ATZ", "Modem reset\nOK\r\n"),
    ("AT&F", "Factory settings loaded\r\nOK\r\n"),
    ("AT&W", "Settings saved\r\nOK\r\n"),
    // Device info
    (
        "ATI",
        "CelerFake v1.0\r\nManufacturer: CelerLab\r\nRevision: 2025.01\r\nOK\r\n",
    ),
    ("AT+CGMI", "CelerLab\r\nOK\r\n"),
    ("AT+CGMM", "Celer900\r\nOK\r\n"),
    ("AT+CGMR", "Revision 2025.01\r\nOK\r\n"),
    ("AT+CGSN", "867530900123456\r\nOK\r\n"),
    // SIM & network
    ("AT+CPIN?", "+CPIN: READY\rOK\r\n"),
    ("AT+CSQ?", "+CSQ: 23,99\rOK\r\n"),
    ("AT+CSQ=?", "+CSQ: (0-31,99),(0-7,99)\nOK\r\n"),
    ("AT+CREG?", "+CREG: 0,1\nOK\r\n"),
    ("AT+COPS?", "+COPS: 0,0,\"DTRI Network\",2\r\nOK\r\n"),
    ("AT+COPS=?", "+COPS: (0,0,\"DTRI Network\")\r\nOK\r\n"),
    ("AT+CLCK=?", "+CLCK: (\"SC\")\nOK\r\n"),
    ("AT+CLCK=\"SC\",2", "+CLCK: 0\nOK\r\n"),
    ("AT+CLCK=\"SC\",0,\"0000\"", "OK\r\n"),
    // SMS
    ("AT+CMGF=1", "OK\r\n"),
    ("AT+CMGF=0", "OK\r\n"),
    ("AT+CMGF=?", "+CMGF: (0,1)\r\nOK\r\n"),
    ("AT+CSCA?", "+CSCA: \"+1234567890\",145\r\nOK\r\n"),
    ("AT+CSMP?", "+CSMP: 17,167,0,0\nOK\r\n"),
    ("AT+CMGD=1", "OK\r\n"),
    (
        "AT+CMGL=\"ALL\"",
        "+CMGL: 1,\"REC READ\",\"+12345\",\"22/07/16,12:00:00+00\"\r\nHello\r\nOK\r\n",
    ),
    // GPRS / PDP
    ("AT+CGDCONT=1,\"IP\",\"internet\"", "\rOK\r\n"),
    ("AT+CGDCONT?", "+CGDCONT: 1,\"IP\",\"internet\"\r\nOK\r\n"),
    ("AT+CGDCONT=?", "+CGDCONT: (1-5),\"IP\",\"<APN>\"\rOK\r\n"),
    ("AT+CGATT?", "+CGATT: 1\nOK\r\n"),
    ("AT+CGACT?", "+CGACT: 1,1\nOK\r\n"),
    ("AT+CGACT=1,1", "OK\r\n"),
    ("AT+CGPADDR", "+CGPADDR: 1,10.30.20.5\r\nOK\r\n"),
    // Network & RAT
    ("AT+CFUN=1", "OK\r\n"),
    ("AT+CFUN=0", "OK\r\n"),
    ("AT+CNMP?", "+CNMP: 13\nOK\r\n"),
    ("AT+CNMP=13", "OK\r\n"),
    ("AT+CNSMOD?", "+CNSMOD: 3,1\nOK\r\n"),
    // Calls
    ("ATD100;", "OK\r\n"),
    ("ATH", "OK\r\n"),
    ("ATA", "OK\r\n"),
    ("AT+CLIP=1", "OK\r\n"),
    ("AT+CLIR=1", "OK\r\n"),
    ("AT+COLP=1", "OK\r\n"),
    // TCP/IP
    ("AT+QIOPEN", "OK\r\n"),
    ("AT+QISEND", "> \r\n"),
    ("AT+QICLOSE", "CLOSED\r\nOK\r\n"),
    // Extended errors
    ("AT+CMEE=2", "OK\r\n"),
    ("AT+CMEE=1", "OK\r\n"),
    ("AT+CMEE=0", "OK\r\n"),
    // Vendor extensions
    ("AT+CAVLIINFO", "+CAVLIINFO: Device=C20QS, FW=1.2.3\r\nOK\r\n"),
    ("AT+CAVLISTATE", "+CAVLISTATE: RUNNING\r\nOK\r\n"),
    ("AT+CAVLITEMP?", "+CAVLITEMP: 37.2C\r\nOK\r\n"),
    // GPIO
    ("AT+GPIO=1,1", "OK\r\n"),
    ("AT+GPIO=1,0", "OK\r\n"),
    ("AT+GPIOREAD=1", "+GPIO: 1,1\r\nOK\r\n"),
    // Power / sleep
    ("AT+CSCLK=1", "OK\r\n"),
    ("AT+CSCLK=0", "OK\r\n"),
    ("AT+CGATT=1", "OK\r\n"),
    ("AT+CGATT=0", "OK\r\n"),
    // Storage
    (
        "AT+CPMS?",
        "+CPMS: \"ME\",10,20,\"ME\",10,20,\"ME\",10,20\r\nOK\r\n",
    ),
    // USSD
    ("AT+CUSD=1", "OK\r\n"),
    ("AT+CUSD=2", "OK\r\n"),
    // Clock
    ("AT+CCLK?", "+CCLK: \"25/07/16,12:34:56+00\"\r\nOK\r\n"),
    // Misc
    ("AT+FCLASS?", "+FCLASS: 0\r\nOK\r\n"),
    ("AT+VTD?", "+VTD: 5\r\nOK\r\n"),
    ("AT+COLP?", "+COLP: 1\r\nOK\r\n"),
    ("AT+CR=1", "OK\r\n"),
    ("AT+CRC=1", "OK\r\n"),
    ("AT+ILRR?", "+ILRR: 0\r\nOK\r\n"),
    ("AT+VTS=5", "OK\r\n"),
    ("AT+CLIR?", "+CLIR: 1,1\r\nOK\r\n"),
    ("AT+CLIP?", "+CLIP: 1,1\r\nOK\r\n"),
];
